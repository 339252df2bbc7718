//! Shared error types for the services crate.

use thiserror::Error;

use tarteel_core::model::{ProgressError, SurahNumber};

use crate::sessions::SessionPhase;

/// Errors emitted by `PortionLoader` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content provider returned no data: {0}")]
    EmptyResponse(String),
    #[error("surah {surah} has {available} verses, requested up to {end}")]
    OutOfRange {
        surah: SurahNumber,
        end: u32,
        available: usize,
    },
    #[error("arabic and english editions of surah {0} differ in length")]
    EditionMismatch(SurahNumber),
    #[error("content provider listed unknown surah number {0}")]
    InvalidSurah(u32),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no progress recorded yet; run setup first")]
    NotInitialized,
    #[error("progress already exists")]
    AlreadyInitialized,
    #[error("session already completed")]
    Completed,
    #[error("action belongs to {expected} but the session is in {actual}")]
    WrongPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("portion content has not loaded yet")]
    ContentNotReady,
    #[error("no verse count known for surah {0}")]
    UnknownSurah(SurahNumber),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
