use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonSizeError {
    #[error("lesson size must be one of 3, 5, 7 or 10 verses, got {0}")]
    Unsupported(String),
}

/// Number of new verses introduced per daily lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LessonSize {
    Three,
    #[default]
    Five,
    Seven,
    Ten,
}

impl LessonSize {
    pub const ALL: [LessonSize; 4] = [Self::Three, Self::Five, Self::Seven, Self::Ten];

    #[must_use]
    pub fn verses(self) -> u32 {
        match self {
            Self::Three => 3,
            Self::Five => 5,
            Self::Seven => 7,
            Self::Ten => 10,
        }
    }
}

impl TryFrom<u32> for LessonSize {
    type Error = LessonSizeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|size| size.verses() == value)
            .ok_or_else(|| LessonSizeError::Unsupported(value.to_string()))
    }
}

impl FromStr for LessonSize {
    type Err = LessonSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| LessonSizeError::Unsupported(s.to_owned()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for LessonSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.verses())
    }
}
