use chrono::NaiveDate;

use tarteel_core::model::{Portion, PortionRange, Progress, ReviewScore};

use super::plan::{SessionBuilder, SessionPhase, SessionState};
use super::progress::SessionProgress;
use crate::content::PortionContent;
use crate::error::SessionError;

//
// ─── CONTENT TICKETS ───────────────────────────────────────────────────────────
//

/// A pending content fetch for the current step.
///
/// The ticket changes on every transition; content delivered with an older
/// ticket belongs to a step the learner already left and is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    pub ticket: u64,
    pub range: PortionRange,
}

/// Result of a phase transition: where the session went and the progress
/// value to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub phase: SessionPhase,
    pub progress: Progress,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory daily session stepping through Dhor, Sabaqi and Sabaq.
///
/// Transitions are synchronous and return the whole new `Progress`; the
/// caller persists it. Content for the current step arrives separately via
/// [`SessionService::resolve_content`], and no rating is accepted before it
/// has.
pub struct SessionService {
    builder: SessionBuilder,
    progress: Progress,
    today: NaiveDate,
    state: SessionState,
    reviewed: usize,
    content: Option<PortionContent>,
    ticket: u64,
}

impl SessionService {
    /// Builds the session for `today` from stored progress.
    ///
    /// # Errors
    ///
    /// Propagates `SessionBuilder::build` failures.
    pub fn new(
        builder: SessionBuilder,
        progress: Progress,
        today: NaiveDate,
    ) -> Result<Self, SessionError> {
        let progress = builder.settle(&progress);
        let state = builder.build(&progress, today)?;
        Ok(Self {
            builder,
            progress,
            today,
            state,
            reviewed: 0,
            content: None,
            ticket: 0,
        })
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.state, SessionState::Done)
    }

    /// Verse range the current step works on; `None` once done.
    #[must_use]
    pub fn current_range(&self) -> Option<&PortionRange> {
        self.state.current_range()
    }

    /// The approved portion under review, during Dhor only.
    #[must_use]
    pub fn current_review(&self) -> Option<&Portion> {
        match &self.state {
            SessionState::Dhor { queue, index } => queue.get(*index),
            _ => None,
        }
    }

    #[must_use]
    pub fn content(&self) -> Option<&PortionContent> {
        self.content.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.is_complete() && self.content.is_none()
    }

    #[must_use]
    pub fn session_progress(&self) -> SessionProgress {
        let (queue_position, queue_len) = match &self.state {
            SessionState::Dhor { queue, index } => (*index, queue.len()),
            _ => (0, 0),
        };
        SessionProgress {
            phase: self.phase(),
            queue_position,
            queue_len,
            reviewed: self.reviewed,
            is_complete: self.is_complete(),
        }
    }

    /// The fetch needed before the current step can be rated, if any.
    #[must_use]
    pub fn content_request(&self) -> Option<ContentRequest> {
        if self.content.is_some() {
            return None;
        }
        self.current_range().map(|range| ContentRequest {
            ticket: self.ticket,
            range: range.clone(),
        })
    }

    /// Delivers fetched content. Returns `false` and keeps the session
    /// unchanged when the ticket is stale or the content covers another range.
    pub fn resolve_content(&mut self, ticket: u64, content: PortionContent) -> bool {
        if ticket != self.ticket || self.current_range() != Some(&content.range) {
            return false;
        }
        self.content = Some(content);
        true
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Single rating entry point for both rating paths.
    ///
    /// During Dhor the score is applied as is. During Sabaqi only `Clean`
    /// counts as a successful recitation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::WrongPhase` during Sabaq, plus the errors of
    /// [`SessionService::rate_review`] and [`SessionService::rate_recitation`].
    pub fn rate(&mut self, score: ReviewScore) -> Result<TransitionOutcome, SessionError> {
        match self.phase() {
            SessionPhase::Dhor => self.rate_review(score),
            SessionPhase::Sabaqi => self.rate_recitation(score == ReviewScore::Clean),
            SessionPhase::Sabaq => Err(SessionError::WrongPhase {
                expected: SessionPhase::Dhor,
                actual: SessionPhase::Sabaq,
            }),
            SessionPhase::Done => Err(SessionError::Completed),
        }
    }

    /// Rates the portion under review and moves to the next one.
    ///
    /// # Errors
    ///
    /// Returns `Completed`, `WrongPhase` or `ContentNotReady` without touching
    /// the session.
    pub fn rate_review(&mut self, score: ReviewScore) -> Result<TransitionOutcome, SessionError> {
        self.ensure_ready(SessionPhase::Dhor)?;
        let SessionState::Dhor { queue, index } = &self.state else {
            return Err(self.wrong_phase(SessionPhase::Dhor));
        };
        let Some(portion) = queue.get(*index) else {
            return Err(SessionError::Completed);
        };

        let progress = self
            .progress
            .record_review(portion.id(), score, self.today)?;
        let next_index = index + 1;
        let next = if next_index < queue.len() {
            Ok(SessionState::Dhor {
                queue: queue.clone(),
                index: next_index,
            })
        } else {
            self.builder.after_review(&progress)
        };

        self.reviewed += 1;
        Ok(self.advance(next, progress))
    }

    /// Records whether yesterday's lesson was recited from memory.
    ///
    /// A pass graduates it into the review pool; a miss keeps it pending for
    /// tomorrow.
    ///
    /// # Errors
    ///
    /// Returns `Completed`, `WrongPhase` or `ContentNotReady` without touching
    /// the session.
    pub fn rate_recitation(&mut self, passed: bool) -> Result<TransitionOutcome, SessionError> {
        self.ensure_ready(SessionPhase::Sabaqi)?;
        let progress = if passed {
            self.progress.graduate_pending(self.today)
        } else {
            self.progress.clone()
        };
        let next = self.builder.lesson(&progress);
        Ok(self.advance(next, progress))
    }

    /// Accepts today's lesson and finishes the session.
    ///
    /// # Errors
    ///
    /// Returns `Completed`, `WrongPhase` or `ContentNotReady` without touching
    /// the session.
    pub fn approve(&mut self) -> Result<TransitionOutcome, SessionError> {
        self.ensure_ready(SessionPhase::Sabaq)?;
        let SessionState::Sabaq {
            lesson,
            surah_length,
        } = &self.state
        else {
            return Err(self.wrong_phase(SessionPhase::Sabaq));
        };

        let progress =
            self.progress
                .approve_lesson(lesson.clone(), self.builder.lesson_size(), *surah_length);
        Ok(self.advance(Ok(SessionState::Done), progress))
    }

    fn ensure_ready(&self, expected: SessionPhase) -> Result<(), SessionError> {
        let actual = self.phase();
        if actual == SessionPhase::Done {
            return Err(SessionError::Completed);
        }
        if actual != expected {
            return Err(self.wrong_phase(expected));
        }
        if self.content.is_none() {
            return Err(SessionError::ContentNotReady);
        }
        Ok(())
    }

    fn wrong_phase(&self, expected: SessionPhase) -> SessionError {
        SessionError::WrongPhase {
            expected,
            actual: self.phase(),
        }
    }

    // A lesson that cannot be computed ends the session; the progress that
    // led there is still returned for persisting.
    fn advance(
        &mut self,
        next: Result<SessionState, SessionError>,
        progress: Progress,
    ) -> TransitionOutcome {
        let from = self.phase();
        self.state = next.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "no lesson available; ending session");
            SessionState::Done
        });
        self.progress = progress;
        self.content = None;
        self.ticket += 1;

        let phase = self.phase();
        tracing::info!(%from, to = %phase, reviewed = self.reviewed, "session transition");
        TransitionOutcome {
            phase,
            progress: self.progress.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tarteel_core::model::{LessonSize, SurahNumber};
    use tarteel_core::quran::{StaticSurahIndex, SurahIndex};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn surah(n: u32) -> SurahNumber {
        SurahNumber::new(n).unwrap()
    }

    fn range(n: u32, start: u32, end: u32) -> PortionRange {
        PortionRange::new(surah(n), start, end).unwrap()
    }

    fn approved(n: u32, start: u32, end: u32, next_review: NaiveDate) -> Portion {
        Portion::from_persisted(range(n, start, end), 0, next_review, ReviewScore::Clean)
    }

    fn builder() -> SessionBuilder {
        SessionBuilder::new(Arc::new(StaticSurahIndex)).with_lesson_size(LessonSize::Five)
    }

    fn content_for(range: &PortionRange) -> PortionContent {
        PortionContent {
            range: range.clone(),
            surah_arabic_name: "سورة".into(),
            surah_english_name: "Test".into(),
            verses: Vec::new(),
        }
    }

    // Resolves whatever the session currently waits for.
    fn load(session: &mut SessionService) {
        let request = session.content_request().expect("content request");
        assert!(session.resolve_content(request.ticket, content_for(&request.range)));
    }

    #[test]
    fn due_review_then_new_lesson() {
        let today = date(2024, 1, 2);
        let progress = Progress::from_persisted(
            surah(2),
            5,
            vec![approved(2, 0, 5, today)],
            None,
            date(2024, 1, 1),
        );
        let mut session = SessionService::new(builder(), progress, today).unwrap();
        assert_eq!(session.phase(), SessionPhase::Dhor);

        load(&mut session);
        let outcome = session.rate(ReviewScore::Clean).unwrap();
        assert_eq!(outcome.phase, SessionPhase::Sabaq);

        let reviewed = outcome.progress.approved_portions()[0].clone();
        assert_eq!(reviewed.review_count(), 1);
        assert_eq!(reviewed.next_review(), date(2024, 1, 5));
        assert_eq!(reviewed.last_score(), ReviewScore::Clean);

        let SessionState::Sabaq { lesson, .. } = session.state() else {
            panic!("expected sabaq");
        };
        assert_eq!(lesson, &range(2, 5, 10));
    }

    #[test]
    fn dhor_walks_the_whole_queue_once() {
        let today = date(2024, 1, 2);
        let progress = Progress::from_persisted(
            surah(2),
            10,
            vec![approved(1, 0, 5, today), approved(1, 5, 7, today)],
            Some(range(2, 5, 10)),
            date(2024, 1, 1),
        );
        let mut session = SessionService::new(builder(), progress, today).unwrap();

        load(&mut session);
        let first = session.rate(ReviewScore::Missed).unwrap();
        assert_eq!(first.phase, SessionPhase::Dhor);
        assert_eq!(session.session_progress().queue_position, 1);
        assert_eq!(first.progress.approved_portions()[0].next_review(), date(2024, 1, 3));

        load(&mut session);
        let second = session.rate(ReviewScore::Shaky).unwrap();
        assert_eq!(second.phase, SessionPhase::Sabaqi);
        assert_eq!(session.session_progress().reviewed, 2);
    }

    #[test]
    fn ratings_wait_for_content() {
        let today = date(2024, 1, 2);
        let progress =
            Progress::from_persisted(surah(2), 5, Vec::new(), None, date(2024, 1, 1));
        let mut session = SessionService::new(builder(), progress.clone(), today).unwrap();
        assert!(session.is_loading());

        let err = session.approve().unwrap_err();
        assert!(matches!(err, SessionError::ContentNotReady));
        assert_eq!(session.phase(), SessionPhase::Sabaq);
        assert_eq!(session.progress(), &progress);
    }

    #[test]
    fn stale_content_is_discarded() {
        let today = date(2024, 1, 2);
        let progress = Progress::from_persisted(
            surah(2),
            10,
            vec![approved(1, 0, 5, today)],
            Some(range(2, 5, 10)),
            date(2024, 1, 1),
        );
        let mut session = SessionService::new(builder(), progress, today).unwrap();
        let stale = session.content_request().unwrap();

        load(&mut session);
        session.rate(ReviewScore::Clean).unwrap();
        assert_eq!(session.phase(), SessionPhase::Sabaqi);

        assert!(!session.resolve_content(stale.ticket, content_for(&stale.range)));
        assert!(session.is_loading());

        let current = session.content_request().unwrap();
        assert_ne!(current.ticket, stale.ticket);
        assert!(!session.resolve_content(current.ticket, content_for(&stale.range)));
        assert!(session.resolve_content(current.ticket, content_for(&current.range)));
        assert!(session.content_request().is_none());
    }

    #[test]
    fn sabaqi_pass_graduates_and_fail_keeps_pending() {
        let today = date(2024, 1, 2);
        let progress = Progress::from_persisted(
            surah(2),
            10,
            Vec::new(),
            Some(range(2, 5, 10)),
            date(2024, 1, 1),
        );

        let mut passed = SessionService::new(builder(), progress.clone(), today).unwrap();
        load(&mut passed);
        let outcome = passed.rate_recitation(true).unwrap();
        assert_eq!(outcome.phase, SessionPhase::Sabaq);
        assert_eq!(outcome.progress.approved_portions().len(), 1);
        assert!(outcome.progress.pending_sabaqi().is_none());
        let graduated = &outcome.progress.approved_portions()[0];
        assert_eq!(graduated.review_count(), 0);
        assert_eq!(graduated.next_review(), date(2024, 1, 3));

        let mut failed = SessionService::new(builder(), progress.clone(), today).unwrap();
        load(&mut failed);
        let outcome = failed.rate(ReviewScore::Shaky).unwrap();
        assert_eq!(outcome.phase, SessionPhase::Sabaq);
        assert_eq!(outcome.progress, progress);
    }

    #[test]
    fn approve_sets_pending_and_finishes() {
        let today = date(2024, 1, 2);
        let progress =
            Progress::from_persisted(surah(2), 284, Vec::new(), None, date(2024, 1, 1));
        let mut session = SessionService::new(builder(), progress, today).unwrap();
        load(&mut session);

        let outcome = session.approve().unwrap();
        assert_eq!(outcome.phase, SessionPhase::Done);
        assert_eq!(outcome.progress.pending_sabaqi(), Some(&range(2, 284, 286)));
        assert_eq!(outcome.progress.current_surah(), surah(3));
        assert_eq!(outcome.progress.current_ayah_index(), 0);
        assert!(session.is_complete());
        assert!(session.content_request().is_none());

        assert!(matches!(session.approve(), Err(SessionError::Completed)));
        assert!(matches!(
            session.rate(ReviewScore::Clean),
            Err(SessionError::Completed)
        ));
    }

    #[test]
    fn missing_lesson_after_reviews_ends_session_with_reviewed_progress() {
        struct EmptyIndex;
        impl SurahIndex for EmptyIndex {
            fn verse_count(&self, _surah: SurahNumber) -> Option<u32> {
                None
            }
        }

        let today = date(2024, 1, 2);
        let progress = Progress::from_persisted(
            surah(3),
            0,
            vec![approved(2, 0, 5, today)],
            None,
            date(2024, 1, 1),
        );
        let builder = SessionBuilder::new(Arc::new(EmptyIndex));
        let mut session = SessionService::new(builder, progress, today).unwrap();
        assert_eq!(session.phase(), SessionPhase::Dhor);
        load(&mut session);

        let outcome = session.rate(ReviewScore::Clean).unwrap();
        assert_eq!(outcome.phase, SessionPhase::Done);
        assert_eq!(outcome.progress.approved_portions()[0].review_count(), 1);
        assert_eq!(session.progress(), &outcome.progress);
        assert!(session.is_complete());
        assert!(session.content_request().is_none());

        assert!(matches!(session.approve(), Err(SessionError::Completed)));
        assert!(matches!(
            session.rate(ReviewScore::Clean),
            Err(SessionError::Completed)
        ));
    }

    #[test]
    fn actions_outside_their_phase_are_rejected() {
        let today = date(2024, 1, 2);
        let progress =
            Progress::from_persisted(surah(2), 5, Vec::new(), None, date(2024, 1, 1));
        let mut session = SessionService::new(builder(), progress, today).unwrap();
        load(&mut session);

        let err = session.rate_recitation(true).unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongPhase {
                expected: SessionPhase::Sabaqi,
                actual: SessionPhase::Sabaq
            }
        ));
        assert!(matches!(
            session.rate(ReviewScore::Clean),
            Err(SessionError::WrongPhase { .. })
        ));
        assert_eq!(session.phase(), SessionPhase::Sabaq);
    }
}
