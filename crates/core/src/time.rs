use chrono::{Days, Local, NaiveDate};

/// A calendar clock abstraction for deterministic dates in services and tests.
///
/// Scheduling works on whole days in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(NaiveDate),
}

impl Clock {
    /// Returns a clock that uses the host's local date.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given date.
    #[must_use]
    pub fn fixed(on: NaiveDate) -> Self {
        Self::Fixed(on)
    }

    /// Returns today's date according to the clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Default => Local::now().date_naive(),
            Clock::Fixed(d) => *d,
        }
    }

    /// If this is a fixed clock, advance it by `days`.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance_days(&mut self, days: u64) {
        if let Clock::Fixed(d) = self {
            *d = d.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        }
    }

    /// Returns true if this clock represents real time.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }

    /// Returns true if this clock is fixed.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Returns a deterministic date (2024-01-02) for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed date cannot be represented.
#[must_use]
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).expect("fixed date should be valid")
}

/// Returns a `Clock` fixed at the deterministic test date.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_today())
}
