use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use tarteel_core::model::{LessonSize, Portion, PortionRange, Progress};
use tarteel_core::quran::SurahIndex;

use crate::error::SessionError;

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// The four steps of a daily session, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Spaced review of due portions.
    Dhor,
    /// Re-recitation of yesterday's lesson.
    Sabaqi,
    /// Today's new lesson.
    Sabaq,
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::Dhor => "dhor",
            SessionPhase::Sabaqi => "sabaqi",
            SessionPhase::Sabaq => "sabaq",
            SessionPhase::Done => "done",
        };
        f.write_str(label)
    }
}

/// Phase together with the data it works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Dhor { queue: Vec<Portion>, index: usize },
    Sabaqi { portion: PortionRange },
    Sabaq { lesson: PortionRange, surah_length: u32 },
    Done,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Dhor { .. } => SessionPhase::Dhor,
            SessionState::Sabaqi { .. } => SessionPhase::Sabaqi,
            SessionState::Sabaq { .. } => SessionPhase::Sabaq,
            SessionState::Done => SessionPhase::Done,
        }
    }

    /// Verse range whose content the current step displays.
    #[must_use]
    pub fn current_range(&self) -> Option<&PortionRange> {
        match self {
            SessionState::Dhor { queue, index } => queue.get(*index).map(Portion::range),
            SessionState::Sabaqi { portion } => Some(portion),
            SessionState::Sabaq { lesson, .. } => Some(lesson),
            SessionState::Done => None,
        }
    }
}

//
// ─── BUILDER ───────────────────────────────────────────────────────────────────
//

/// Picks the starting phase of a session from stored progress.
#[derive(Clone)]
pub struct SessionBuilder {
    surahs: Arc<dyn SurahIndex>,
    lesson_size: LessonSize,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(surahs: Arc<dyn SurahIndex>) -> Self {
        Self {
            surahs,
            lesson_size: LessonSize::default(),
        }
    }

    #[must_use]
    pub fn with_lesson_size(mut self, lesson_size: LessonSize) -> Self {
        self.lesson_size = lesson_size;
        self
    }

    #[must_use]
    pub fn lesson_size(&self) -> LessonSize {
        self.lesson_size
    }

    /// Due portions first, then a pending Sabaqi, then a new lesson.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownSurah` when the lesson surah has no known
    /// length, or `SessionError::Progress` when the reading position is already
    /// past its end.
    pub fn build(&self, progress: &Progress, today: NaiveDate) -> Result<SessionState, SessionError> {
        let queue: Vec<Portion> = progress.due_portions(today).cloned().collect();
        if !queue.is_empty() {
            return Ok(SessionState::Dhor { queue, index: 0 });
        }
        self.after_review(progress)
    }

    /// The step following an exhausted review queue.
    pub(crate) fn after_review(&self, progress: &Progress) -> Result<SessionState, SessionError> {
        match progress.pending_sabaqi() {
            Some(pending) => Ok(SessionState::Sabaqi {
                portion: pending.clone(),
            }),
            None => self.lesson(progress),
        }
    }

    /// `progress` with a reading position past the end of its surah moved
    /// to the start of the next one. An unknown surah is left as is; the
    /// lesson lookup reports it.
    #[must_use]
    pub fn settle(&self, progress: &Progress) -> Progress {
        let surah = progress.current_surah();
        let Some(surah_length) = self.surahs.verse_count(surah) else {
            return progress.clone();
        };
        let settled = progress.settle_position(surah_length);
        if settled.current_surah() != surah {
            tracing::info!(
                from = %surah,
                to = %settled.current_surah(),
                "reading position was past the end of its surah"
            );
        }
        settled
    }

    /// Today's Sabaq for `progress`.
    ///
    /// # Errors
    ///
    /// See [`SessionBuilder::build`].
    pub fn lesson(&self, progress: &Progress) -> Result<SessionState, SessionError> {
        let surah = progress.current_surah();
        let surah_length = self
            .surahs
            .verse_count(surah)
            .ok_or(SessionError::UnknownSurah(surah))?;
        let lesson = progress.lesson(self.lesson_size, surah_length)?;
        Ok(SessionState::Sabaq {
            lesson,
            surah_length,
        })
    }
}
