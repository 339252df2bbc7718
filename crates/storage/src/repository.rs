use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tarteel_core::model::Progress;
use thiserror::Error;

use crate::mapping::{PROGRESS_KEY, decode_progress, encode_progress};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the learner's progress record.
///
/// Adapters report every failure; deciding which failures are tolerable is
/// left to the caller.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the persisted progress, `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be read or decoded.
    async fn get_progress(&self) -> Result<Option<Progress>, StorageError>;

    /// Persist or replace the progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or stored.
    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError>;
}

/// Simple in-memory key/value repository for testing and prototyping.
///
/// Values are kept as serialized JSON text so reads go through the same
/// decoding as the persistent adapters.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Overwrite a raw record, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Read a raw record as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self) -> Result<Option<Progress>, StorageError> {
        self.get_raw(PROGRESS_KEY)?
            .map(|raw| decode_progress(&raw))
            .transpose()
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let raw = encode_progress(progress)?;
        self.put_raw(PROGRESS_KEY, raw)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
