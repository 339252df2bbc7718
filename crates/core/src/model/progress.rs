use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{IdError, PortionId, SurahNumber};
use crate::model::lesson::LessonSize;
use crate::model::portion::{Portion, PortionError, PortionRange};
use crate::model::review::ReviewScore;
use crate::quran::SurahIndex;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Id(#[from] IdError),

    #[error(transparent)]
    Portion(#[from] PortionError),

    #[error("starting verse is one-based and must be at least 1")]
    StartingVerseZero,

    #[error("no verse count known for surah {0}")]
    UnknownSurah(SurahNumber),

    #[error("portion {0} is not in the review pool")]
    UnknownPortion(PortionId),
}

//
// ─── SETUP ─────────────────────────────────────────────────────────────────────
//

/// Learner input for the one-time setup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDraft {
    pub surah: u32,
    /// One-based verse number, as shown in a mushaf.
    pub starting_verse: u32,
}

impl ProgressDraft {
    #[must_use]
    pub fn new(surah: u32, starting_verse: u32) -> Self {
        Self {
            surah,
            starting_verse,
        }
    }

    /// Validate the draft and create fresh progress.
    ///
    /// A starting verse past the end of the surah is clamped to its last verse.
    ///
    /// # Errors
    ///
    /// - `Id` if the surah is outside `1..=114`
    /// - `StartingVerseZero` if the starting verse is 0
    /// - `UnknownSurah` if `surahs` has no verse count for the surah
    pub fn validate(
        self,
        today: NaiveDate,
        surahs: &dyn SurahIndex,
    ) -> Result<Progress, ProgressError> {
        let surah = SurahNumber::new(self.surah)?;
        if self.starting_verse == 0 {
            return Err(ProgressError::StartingVerseZero);
        }
        let verse_count = surahs
            .verse_count(surah)
            .filter(|&count| count > 0)
            .ok_or(ProgressError::UnknownSurah(surah))?;
        let start_index = self.starting_verse.min(verse_count) - 1;

        Ok(Progress {
            current_surah: surah,
            current_ayah_index: start_index,
            approved: Vec::new(),
            pending_sabaqi: None,
            started_at: today,
        })
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// The learner's durable memorisation state.
///
/// Every mutation is expressed as a method returning a new `Progress`, so a
/// caller can persist the whole value or discard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    current_surah: SurahNumber,
    current_ayah_index: u32,
    approved: Vec<Portion>,
    pending_sabaqi: Option<PortionRange>,
    started_at: NaiveDate,
}

impl Progress {
    /// Rehydrate progress from persisted storage.
    ///
    /// Approved portions keep their stored order. Should a stored record list
    /// the same id twice, only the first entry is kept.
    #[must_use]
    pub fn from_persisted(
        current_surah: SurahNumber,
        current_ayah_index: u32,
        approved: Vec<Portion>,
        pending_sabaqi: Option<PortionRange>,
        started_at: NaiveDate,
    ) -> Self {
        let mut seen = HashSet::new();
        let approved = approved
            .into_iter()
            .filter(|portion| seen.insert(portion.id().clone()))
            .collect();

        Self {
            current_surah,
            current_ayah_index,
            approved,
            pending_sabaqi,
            started_at,
        }
    }

    #[must_use]
    pub fn current_surah(&self) -> SurahNumber {
        self.current_surah
    }

    /// Zero-based index of the next verse not yet introduced.
    #[must_use]
    pub fn current_ayah_index(&self) -> u32 {
        self.current_ayah_index
    }

    /// Graduated portions in insertion order.
    #[must_use]
    pub fn approved_portions(&self) -> &[Portion] {
        &self.approved
    }

    #[must_use]
    pub fn pending_sabaqi(&self) -> Option<&PortionRange> {
        self.pending_sabaqi.as_ref()
    }

    #[must_use]
    pub fn started_at(&self) -> NaiveDate {
        self.started_at
    }

    #[must_use]
    pub fn portion(&self, id: &PortionId) -> Option<&Portion> {
        self.approved.iter().find(|portion| portion.id() == id)
    }

    /// Portions due on `today`, in insertion order.
    pub fn due_portions(&self, today: NaiveDate) -> impl Iterator<Item = &Portion> + '_ {
        self.approved
            .iter()
            .filter(move |portion| portion.is_due(today))
    }

    /// Today's new lesson: `lesson_size` verses from the current position,
    /// truncated at the end of the surah.
    ///
    /// # Errors
    ///
    /// Returns `Portion(EmptyRange)` if the current position is already past
    /// the end of the surah.
    pub fn lesson(
        &self,
        lesson_size: LessonSize,
        surah_length: u32,
    ) -> Result<PortionRange, ProgressError> {
        let start = self.current_ayah_index;
        let end = start.saturating_add(lesson_size.verses()).min(surah_length);
        Ok(PortionRange::new(self.current_surah, start, end)?)
    }

    /// Applies one Dhor rating to the approved portion `id`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPortion` if `id` is not in the review pool.
    pub fn record_review(
        &self,
        id: &PortionId,
        score: ReviewScore,
        today: NaiveDate,
    ) -> Result<Self, ProgressError> {
        let mut next = self.clone();
        let portion = next
            .approved
            .iter_mut()
            .find(|portion| portion.id() == id)
            .ok_or_else(|| ProgressError::UnknownPortion(id.clone()))?;
        portion.apply_review(score, today);
        Ok(next)
    }

    /// Moves the pending Sabaqi into the review pool.
    ///
    /// A portion with the same id already in the pool is replaced in place.
    /// Without a pending portion this is a no-op.
    #[must_use]
    pub fn graduate_pending(&self, today: NaiveDate) -> Self {
        let mut next = self.clone();
        let Some(range) = next.pending_sabaqi.take() else {
            return next;
        };
        let graduated = Portion::graduate(range, today);
        match next
            .approved
            .iter_mut()
            .find(|portion| portion.id() == graduated.id())
        {
            Some(existing) => *existing = graduated,
            None => next.approved.push(graduated),
        }
        next
    }

    /// Accepts today's lesson: it becomes the pending Sabaqi and the reading
    /// position advances by `lesson_size`, rolling over into the next surah
    /// once the end of `surah_length` is reached.
    #[must_use]
    pub fn approve_lesson(
        &self,
        lesson: PortionRange,
        lesson_size: LessonSize,
        surah_length: u32,
    ) -> Self {
        let mut next = self.clone();
        next.pending_sabaqi = Some(lesson);
        next.current_ayah_index = next
            .current_ayah_index
            .saturating_add(lesson_size.verses());
        if next.current_ayah_index >= surah_length {
            next.current_surah = next.current_surah.next_saturating();
            next.current_ayah_index = 0;
        }
        next
    }

    /// Moves a reading position that sits at or past the end of
    /// `surah_length` to the start of the next surah. A position inside the
    /// surah is returned unchanged.
    #[must_use]
    pub fn settle_position(&self, surah_length: u32) -> Self {
        let mut next = self.clone();
        if next.current_ayah_index >= surah_length {
            next.current_surah = next.current_surah.next_saturating();
            next.current_ayah_index = 0;
        }
        next
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::StaticSurahIndex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn surah(n: u32) -> SurahNumber {
        SurahNumber::new(n).unwrap()
    }

    fn approved(n: u32, start: u32, end: u32, next_review: NaiveDate) -> Portion {
        Portion::from_persisted(
            PortionRange::new(surah(n), start, end).unwrap(),
            0,
            next_review,
            ReviewScore::Clean,
        )
    }

    fn progress_at(n: u32, index: u32) -> Progress {
        Progress::from_persisted(surah(n), index, Vec::new(), None, date(2024, 1, 1))
    }

    #[test]
    fn draft_converts_one_based_verse() {
        let progress = ProgressDraft::new(2, 6)
            .validate(date(2024, 1, 1), &StaticSurahIndex)
            .unwrap();
        assert_eq!(progress.current_surah(), surah(2));
        assert_eq!(progress.current_ayah_index(), 5);
        assert!(progress.approved_portions().is_empty());
        assert!(progress.pending_sabaqi().is_none());
        assert_eq!(progress.started_at(), date(2024, 1, 1));
    }

    #[test]
    fn draft_clamps_verse_past_end_of_surah() {
        let progress = ProgressDraft::new(1, 50)
            .validate(date(2024, 1, 1), &StaticSurahIndex)
            .unwrap();
        assert_eq!(progress.current_ayah_index(), 6);
    }

    #[test]
    fn draft_rejects_invalid_input() {
        let today = date(2024, 1, 1);
        assert!(matches!(
            ProgressDraft::new(0, 1).validate(today, &StaticSurahIndex),
            Err(ProgressError::Id(_))
        ));
        assert!(matches!(
            ProgressDraft::new(115, 1).validate(today, &StaticSurahIndex),
            Err(ProgressError::Id(_))
        ));
        assert_eq!(
            ProgressDraft::new(2, 0).validate(today, &StaticSurahIndex),
            Err(ProgressError::StartingVerseZero)
        );
    }

    #[test]
    fn persisted_duplicates_keep_first_entry() {
        let first = approved(2, 0, 5, date(2024, 1, 1));
        let dup = approved(2, 0, 7, date(2024, 2, 1));
        let progress = Progress::from_persisted(
            surah(2),
            5,
            vec![first.clone(), dup],
            None,
            date(2024, 1, 1),
        );
        assert_eq!(progress.approved_portions(), &[first]);
    }

    #[test]
    fn due_portions_keep_insertion_order() {
        let progress = Progress::from_persisted(
            surah(3),
            0,
            vec![
                approved(2, 10, 15, date(2024, 1, 2)),
                approved(2, 0, 5, date(2024, 1, 9)),
                approved(2, 5, 10, date(2023, 12, 1)),
            ],
            None,
            date(2023, 11, 1),
        );
        let due: Vec<_> = progress
            .due_portions(date(2024, 1, 2))
            .map(|p| p.id().as_str().to_owned())
            .collect();
        assert_eq!(due, vec!["2-10", "2-5"]);
    }

    #[test]
    fn lesson_truncates_at_end_of_surah() {
        let lesson = progress_at(2, 5).lesson(LessonSize::Five, 286).unwrap();
        assert_eq!((lesson.start(), lesson.end()), (5, 10));
        assert_eq!(lesson.id().as_str(), "2-5");

        let tail = progress_at(2, 284).lesson(LessonSize::Five, 286).unwrap();
        assert_eq!((tail.start(), tail.end()), (284, 286));

        assert!(progress_at(2, 286).lesson(LessonSize::Five, 286).is_err());
    }

    #[test]
    fn record_review_updates_only_target() {
        let progress = Progress::from_persisted(
            surah(3),
            0,
            vec![
                approved(2, 0, 5, date(2024, 1, 1)),
                approved(2, 5, 10, date(2024, 1, 1)),
            ],
            None,
            date(2023, 11, 1),
        );
        let id: PortionId = "2-5".parse().unwrap();
        let next = progress
            .record_review(&id, ReviewScore::Clean, date(2024, 1, 2))
            .unwrap();

        assert_eq!(next.portion(&id).unwrap().review_count(), 1);
        assert_eq!(next.approved_portions()[0], progress.approved_portions()[0]);
        // the original value is untouched
        assert_eq!(progress.portion(&id).unwrap().review_count(), 0);
    }

    #[test]
    fn record_review_rejects_unknown_portion() {
        let id: PortionId = "9-0".parse().unwrap();
        let err = progress_at(2, 0)
            .record_review(&id, ReviewScore::Clean, date(2024, 1, 2))
            .unwrap_err();
        assert_eq!(err, ProgressError::UnknownPortion(id));
    }

    #[test]
    fn graduation_moves_pending_into_pool() {
        let pending = PortionRange::new(surah(2), 5, 10).unwrap();
        let progress = Progress::from_persisted(
            surah(2),
            10,
            vec![approved(2, 0, 5, date(2024, 1, 5))],
            Some(pending.clone()),
            date(2024, 1, 1),
        );
        let next = progress.graduate_pending(date(2024, 1, 2));

        assert!(next.pending_sabaqi().is_none());
        assert_eq!(next.approved_portions().len(), 2);
        let graduated = next.portion(pending.id()).unwrap();
        assert_eq!(graduated.review_count(), 0);
        assert_eq!(graduated.last_score(), ReviewScore::Clean);
        assert_eq!(graduated.next_review(), date(2024, 1, 3));
    }

    #[test]
    fn graduation_replaces_existing_id() {
        let pending = PortionRange::new(surah(114), 0, 5).unwrap();
        let progress = Progress::from_persisted(
            surah(114),
            0,
            vec![approved(114, 0, 5, date(2025, 1, 1))],
            Some(pending),
            date(2024, 1, 1),
        );
        let next = progress.graduate_pending(date(2024, 6, 1));
        assert_eq!(next.approved_portions().len(), 1);
        assert_eq!(next.approved_portions()[0].next_review(), date(2024, 6, 2));
    }

    #[test]
    fn approve_advances_position() {
        let progress = progress_at(2, 5);
        let lesson = progress.lesson(LessonSize::Five, 286).unwrap();
        let next = progress.approve_lesson(lesson.clone(), LessonSize::Five, 286);
        assert_eq!(next.pending_sabaqi(), Some(&lesson));
        assert_eq!(next.current_surah(), surah(2));
        assert_eq!(next.current_ayah_index(), 10);
    }

    #[test]
    fn approve_rolls_over_to_next_surah() {
        let progress = progress_at(2, 284);
        let lesson = progress.lesson(LessonSize::Five, 286).unwrap();
        let next = progress.approve_lesson(lesson, LessonSize::Five, 286);
        assert_eq!(next.current_surah(), surah(3));
        assert_eq!(next.current_ayah_index(), 0);
    }

    #[test]
    fn approve_on_last_surah_stays_on_last_surah() {
        let progress = progress_at(114, 3);
        let lesson = progress.lesson(LessonSize::Five, 6).unwrap();
        let next = progress.approve_lesson(lesson, LessonSize::Five, 6);
        assert_eq!(next.current_surah(), SurahNumber::LAST);
        assert_eq!(next.current_ayah_index(), 0);
    }

    #[test]
    fn settle_moves_finished_surah_to_next() {
        // Al-Fatiha has 7 verses.
        let finished = progress_at(1, 10).settle_position(7);
        assert_eq!(finished.current_surah(), surah(2));
        assert_eq!(finished.current_ayah_index(), 0);
        assert_eq!(finished.lesson(LessonSize::Five, 286).unwrap().id().as_str(), "2-0");

        let inside = progress_at(1, 6);
        assert_eq!(inside.settle_position(7), inside);
    }
}
