use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ids::{PortionId, SurahNumber};
use crate::model::review::ReviewScore;
use crate::scheduler::IntervalScheduler;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PortionError {
    #[error("portion range is empty: start {start}, end {end}")]
    EmptyRange { start: u32, end: u32 },
}

//
// ─── PORTION RANGE ─────────────────────────────────────────────────────────────
//

/// A contiguous, half-open verse range `[start, end)` within one surah.
///
/// This is the descriptor used for the daily lesson (Sabaq) and for the
/// pending recitation (Sabaqi). It becomes a [`Portion`] once graduated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortionRange {
    id: PortionId,
    surah: SurahNumber,
    start: u32,
    end: u32,
}

impl PortionRange {
    /// Creates a range and derives its id.
    ///
    /// # Errors
    ///
    /// Returns `PortionError::EmptyRange` unless `end > start`.
    pub fn new(surah: SurahNumber, start: u32, end: u32) -> Result<Self, PortionError> {
        Self::from_persisted(PortionId::derive(surah, start), surah, start, end)
    }

    /// Rehydrates a range keeping its stored id verbatim.
    ///
    /// # Errors
    ///
    /// Returns `PortionError::EmptyRange` unless `end > start`.
    pub fn from_persisted(
        id: PortionId,
        surah: SurahNumber,
        start: u32,
        end: u32,
    ) -> Result<Self, PortionError> {
        if end <= start {
            return Err(PortionError::EmptyRange { start, end });
        }
        Ok(Self {
            id,
            surah,
            start,
            end,
        })
    }

    #[must_use]
    pub fn id(&self) -> &PortionId {
        &self.id
    }

    #[must_use]
    pub fn surah(&self) -> SurahNumber {
        self.surah
    }

    /// Zero-based index of the first verse.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Zero-based index one past the last verse.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }

    #[must_use]
    pub fn verse_count(&self) -> u32 {
        self.end - self.start
    }
}

//
// ─── PORTION ───────────────────────────────────────────────────────────────────
//

/// A graduated portion in the long-term review pool (Dhor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portion {
    range: PortionRange,
    review_count: u32,
    next_review: NaiveDate,
    last_score: ReviewScore,
}

impl Portion {
    /// Graduates a recited range into the review pool.
    ///
    /// The first review is scheduled from the interval table at review count
    /// zero, which is tomorrow.
    #[must_use]
    pub fn graduate(range: PortionRange, today: NaiveDate) -> Self {
        let score = ReviewScore::Clean;
        Self {
            range,
            review_count: 0,
            next_review: IntervalScheduler::next_review_date(today, 0, score),
            last_score: score,
        }
    }

    /// Rehydrate a portion from persisted storage.
    #[must_use]
    pub fn from_persisted(
        range: PortionRange,
        review_count: u32,
        next_review: NaiveDate,
        last_score: ReviewScore,
    ) -> Self {
        Self {
            range,
            review_count,
            next_review,
            last_score,
        }
    }

    #[must_use]
    pub fn range(&self) -> &PortionRange {
        &self.range
    }

    #[must_use]
    pub fn id(&self) -> &PortionId {
        self.range.id()
    }

    #[must_use]
    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    #[must_use]
    pub fn next_review(&self) -> NaiveDate {
        self.next_review
    }

    #[must_use]
    pub fn last_score(&self) -> ReviewScore {
        self.last_score
    }

    /// Due portions have a next review on or before `today`.
    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    /// Records one completed Dhor review.
    ///
    /// The review count is incremented first and the new count selects the interval.
    pub fn apply_review(&mut self, score: ReviewScore, today: NaiveDate) {
        self.review_count = self.review_count.saturating_add(1);
        self.next_review = IntervalScheduler::next_review_date(today, self.review_count, score);
        self.last_score = score;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
