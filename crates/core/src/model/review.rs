use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when reading a review score.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewScoreError {
    #[error("invalid review score value: {0}")]
    InvalidScore(u8),
}

//
// ─── REVIEW SCORE ─────────────────────────────────────────────────────────────
//

/// Three-level quality rating for a recitation.
///
/// - `Missed`: parts of the portion were forgotten, retry tomorrow
/// - `Shaky`: recited with hesitation
/// - `Clean`: recited fluently from memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReviewScore {
    /// Missed some verses. Portion comes back tomorrow.
    Missed,
    /// Recited with hesitation. Interval still grows.
    Shaky,
    /// Recited cleanly. Interval grows.
    Clean,
}

impl ReviewScore {
    /// Converts a numeric score (0-2) to a `ReviewScore`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewScoreError::InvalidScore` if the value is not in the range 0-2.
    pub fn from_u8(value: u8) -> Result<Self, ReviewScoreError> {
        match value {
            0 => Ok(Self::Missed),
            1 => Ok(Self::Shaky),
            2 => Ok(Self::Clean),
            _ => Err(ReviewScoreError::InvalidScore(value)),
        }
    }

    /// Numeric form used in the persisted record.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            ReviewScore::Missed => 0,
            ReviewScore::Shaky => 1,
            ReviewScore::Clean => 2,
        }
    }

    /// Whether the score counts as a successful recall (`score >= 1`).
    #[must_use]
    pub fn is_recalled(self) -> bool {
        self >= ReviewScore::Shaky
    }
}

impl TryFrom<u8> for ReviewScore {
    type Error = ReviewScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

impl From<ReviewScore> for u8 {
    fn from(score: ReviewScore) -> Self {
        score.as_u8()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
