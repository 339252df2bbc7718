use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use tarteel_core::model::Progress;

use super::SqliteRepository;
use crate::mapping::{PROGRESS_KEY, decode_progress, encode_progress};
use crate::repository::{ProgressRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(&self) -> Result<Option<Progress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value
            FROM kv_records
            WHERE key = ?1
            ",
        )
        .bind(PROGRESS_KEY)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("value").map_err(ser)?;
        decode_progress(&raw).map(Some)
    }

    async fn save_progress(&self, progress: &Progress) -> Result<(), StorageError> {
        let raw = encode_progress(progress)?;

        sqlx::query(
            r"
            INSERT INTO kv_records (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(PROGRESS_KEY)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
