use chrono::{Days, NaiveDate};

use crate::model::ReviewScore;

//
// ─── INTERVAL TABLE ────────────────────────────────────────────────────────────
//

/// Review delays in days, indexed by review count and saturating at the last entry.
pub const INTERVAL_TABLE_DAYS: [u32; 6] = [1, 3, 7, 14, 30, 60];

/// Delay applied after a missed recitation, regardless of history.
pub const RETRY_INTERVAL_DAYS: u32 = 1;

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Fixed-table spaced repetition scheduler for memorised portions.
///
/// A missed recitation always comes back tomorrow. Otherwise the delay grows
/// with the number of completed reviews: 1, 3, 7, 14, 30 and finally 60 days,
/// where it stays.
///
/// # Examples
///
/// ```
/// # use tarteel_core::scheduler::IntervalScheduler;
/// # use tarteel_core::model::ReviewScore;
/// assert_eq!(IntervalScheduler::next_interval_days(1, ReviewScore::Clean), 3);
/// assert_eq!(IntervalScheduler::next_interval_days(40, ReviewScore::Missed), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalScheduler;

impl IntervalScheduler {
    /// Days until the next review of a portion with `review_count` completed reviews.
    #[must_use]
    pub fn next_interval_days(review_count: u32, score: ReviewScore) -> u32 {
        if !score.is_recalled() {
            return RETRY_INTERVAL_DAYS;
        }
        let last = INTERVAL_TABLE_DAYS.len() - 1;
        let slot = usize::try_from(review_count).map_or(last, |count| count.min(last));
        INTERVAL_TABLE_DAYS[slot]
    }

    /// Calendar date of the next review, counted from `today`.
    ///
    /// Saturates at `NaiveDate::MAX` instead of overflowing.
    #[must_use]
    pub fn next_review_date(today: NaiveDate, review_count: u32, score: ReviewScore) -> NaiveDate {
        let days = Self::next_interval_days(review_count, score);
        today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missed_is_always_tomorrow() {
        for count in [0, 1, 2, 5, 6, 99, u32::MAX] {
            assert_eq!(IntervalScheduler::next_interval_days(count, ReviewScore::Missed), 1);
        }
    }

    #[test]
    fn clean_follows_table() {
        assert_eq!(IntervalScheduler::next_interval_days(0, ReviewScore::Clean), 1);
        assert_eq!(IntervalScheduler::next_interval_days(1, ReviewScore::Clean), 3);
        assert_eq!(IntervalScheduler::next_interval_days(2, ReviewScore::Clean), 7);
        assert_eq!(IntervalScheduler::next_interval_days(3, ReviewScore::Clean), 14);
        assert_eq!(IntervalScheduler::next_interval_days(4, ReviewScore::Clean), 30);
        assert_eq!(IntervalScheduler::next_interval_days(5, ReviewScore::Clean), 60);
    }

    #[test]
    fn table_saturates_for_large_counts() {
        assert_eq!(IntervalScheduler::next_interval_days(99, ReviewScore::Clean), 60);
        assert_eq!(IntervalScheduler::next_interval_days(u32::MAX, ReviewScore::Shaky), 60);
    }

    #[test]
    fn shaky_uses_same_table_as_clean() {
        for count in 0..10 {
            assert_eq!(
                IntervalScheduler::next_interval_days(count, ReviewScore::Shaky),
                IntervalScheduler::next_interval_days(count, ReviewScore::Clean)
            );
        }
    }

    #[test]
    fn next_review_date_adds_calendar_days() {
        let today = date(2024, 1, 2);
        assert_eq!(
            IntervalScheduler::next_review_date(today, 1, ReviewScore::Clean),
            date(2024, 1, 5)
        );
        assert_eq!(
            IntervalScheduler::next_review_date(date(2024, 2, 28), 0, ReviewScore::Missed),
            date(2024, 2, 29)
        );
        assert_eq!(
            IntervalScheduler::next_review_date(date(2023, 12, 1), 4, ReviewScore::Clean),
            date(2023, 12, 31)
        );
    }

    #[test]
    fn next_review_date_saturates() {
        assert_eq!(
            IntervalScheduler::next_review_date(NaiveDate::MAX, 5, ReviewScore::Clean),
            NaiveDate::MAX
        );
    }
}
