use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of surahs in the Quran.
pub const SURAH_COUNT: u8 = 114;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdError {
    #[error("surah number must be between 1 and {SURAH_COUNT}, got {0}")]
    SurahOutOfRange(u32),

    #[error("invalid portion id: {0}")]
    InvalidPortionId(String),
}

/// One-based surah number, always within `1..=114`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SurahNumber(u8);

impl SurahNumber {
    pub const FIRST: SurahNumber = SurahNumber(1);
    pub const LAST: SurahNumber = SurahNumber(SURAH_COUNT);

    /// Creates a `SurahNumber`.
    ///
    /// # Errors
    ///
    /// Returns `IdError::SurahOutOfRange` if `value` is not in `1..=114`.
    pub fn new(value: u32) -> Result<Self, IdError> {
        match u8::try_from(value) {
            Ok(n) if (1..=SURAH_COUNT).contains(&n) => Ok(Self(n)),
            _ => Err(IdError::SurahOutOfRange(value)),
        }
    }

    /// Returns the underlying value
    #[must_use]
    pub fn value(&self) -> u32 {
        u32::from(self.0)
    }

    /// The following surah, saturating at the last one.
    #[must_use]
    pub fn next_saturating(self) -> Self {
        Self(self.0.saturating_add(1).min(SURAH_COUNT))
    }

    /// Zero-based position, handy for table lookups.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u32> for SurahNumber {
    type Error = IdError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SurahNumber> for u32 {
    fn from(value: SurahNumber) -> Self {
        value.value()
    }
}

/// Stable key of a portion: `"{surah}-{start_index}"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortionId(String);

impl PortionId {
    /// Derives the id for a portion starting at `start_index` of `surah`.
    #[must_use]
    pub fn derive(surah: SurahNumber, start_index: u32) -> Self {
        Self(format!("{surah}-{start_index}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PortionId {
    type Err = IdError;

    /// Accepts any non-empty key; persisted ids are kept verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdError::InvalidPortionId(s.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl fmt::Debug for SurahNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurahNumber({})", self.0)
    }
}

impl fmt::Debug for PortionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortionId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for SurahNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PortionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
