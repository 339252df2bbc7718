//! JSON layout of the persisted progress record.
//!
//! The record is stored as one opaque value under [`PROGRESS_KEY`]. Field names
//! follow the established camelCase layout so existing records keep loading.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tarteel_core::model::{
    Portion, PortionId, PortionRange, Progress, ReviewScore, SurahNumber,
};

use crate::repository::StorageError;

/// Fixed storage identifier of the progress record.
pub const PROGRESS_KEY: &str = "tarteel_progress_v1";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn default_last_score() -> u8 {
    ReviewScore::Clean.as_u8()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub current_surah: u32,
    pub current_ayah_idx: u32,
    #[serde(default)]
    pub approved_portions: Vec<PortionRecord>,
    #[serde(default)]
    pub pending_sabaqi: Option<PendingRecord>,
    pub started_at: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortionRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub surah_num: u32,
    pub start_idx: u32,
    pub end_idx: u32,
    #[serde(default)]
    pub review_count: u32,
    pub next_review: NaiveDate,
    #[serde(default = "default_last_score")]
    pub last_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRecord {
    pub surah_num: u32,
    pub start_idx: u32,
    pub end_idx: u32,
    #[serde(default)]
    pub id: Option<String>,
}

fn range_from_parts(
    id: Option<String>,
    surah_num: u32,
    start_idx: u32,
    end_idx: u32,
) -> Result<PortionRange, StorageError> {
    let surah = SurahNumber::new(surah_num).map_err(ser)?;
    let id = match id {
        Some(raw) => raw.parse::<PortionId>().map_err(ser)?,
        None => PortionId::derive(surah, start_idx),
    };
    PortionRange::from_persisted(id, surah, start_idx, end_idx).map_err(ser)
}

impl PortionRecord {
    #[must_use]
    pub fn from_portion(portion: &Portion) -> Self {
        let range = portion.range();
        Self {
            id: Some(range.id().to_string()),
            surah_num: range.surah().value(),
            start_idx: range.start(),
            end_idx: range.end(),
            review_count: portion.review_count(),
            next_review: portion.next_review(),
            last_score: portion.last_score().as_u8(),
        }
    }

    /// Convert the record back into a domain `Portion`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an invalid surah, range or score.
    pub fn into_portion(self) -> Result<Portion, StorageError> {
        let range = range_from_parts(self.id, self.surah_num, self.start_idx, self.end_idx)?;
        let last_score = ReviewScore::from_u8(self.last_score).map_err(ser)?;
        Ok(Portion::from_persisted(
            range,
            self.review_count,
            self.next_review,
            last_score,
        ))
    }
}

impl PendingRecord {
    #[must_use]
    pub fn from_range(range: &PortionRange) -> Self {
        Self {
            surah_num: range.surah().value(),
            start_idx: range.start(),
            end_idx: range.end(),
            id: Some(range.id().to_string()),
        }
    }

    /// Convert the record back into a domain `PortionRange`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an invalid surah or range.
    pub fn into_range(self) -> Result<PortionRange, StorageError> {
        range_from_parts(self.id, self.surah_num, self.start_idx, self.end_idx)
    }
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &Progress) -> Self {
        Self {
            current_surah: progress.current_surah().value(),
            current_ayah_idx: progress.current_ayah_index(),
            approved_portions: progress
                .approved_portions()
                .iter()
                .map(PortionRecord::from_portion)
                .collect(),
            pending_sabaqi: progress.pending_sabaqi().map(PendingRecord::from_range),
            started_at: progress.started_at(),
        }
    }

    /// Convert the record back into domain `Progress`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any nested value is invalid.
    pub fn into_progress(self) -> Result<Progress, StorageError> {
        let current_surah = SurahNumber::new(self.current_surah).map_err(ser)?;
        let approved = self
            .approved_portions
            .into_iter()
            .map(PortionRecord::into_portion)
            .collect::<Result<Vec<_>, _>>()?;
        let pending = self
            .pending_sabaqi
            .map(PendingRecord::into_range)
            .transpose()?;

        Ok(Progress::from_persisted(
            current_surah,
            self.current_ayah_idx,
            approved,
            pending,
            self.started_at,
        ))
    }
}

/// Serialize progress into its persisted JSON text.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_progress(progress: &Progress) -> Result<String, StorageError> {
    serde_json::to_string(&ProgressRecord::from_progress(progress)).map_err(ser)
}

/// Parse persisted JSON text into progress.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed JSON or invalid values.
pub fn decode_progress(raw: &str) -> Result<Progress, StorageError> {
    serde_json::from_str::<ProgressRecord>(raw)
        .map_err(ser)?
        .into_progress()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_progress() -> Progress {
        let surah = SurahNumber::new(2).unwrap();
        let approved = Portion::from_persisted(
            PortionRange::new(surah, 0, 5).unwrap(),
            3,
            date(2024, 1, 20),
            ReviewScore::Shaky,
        );
        Progress::from_persisted(
            surah,
            10,
            vec![approved],
            Some(PortionRange::new(surah, 5, 10).unwrap()),
            date(2024, 1, 1),
        )
    }

    #[test]
    fn encodes_established_layout() {
        let raw = encode_progress(&sample_progress()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({
                "currentSurah": 2,
                "currentAyahIdx": 10,
                "approvedPortions": [{
                    "id": "2-0", "surahNum": 2, "startIdx": 0, "endIdx": 5,
                    "reviewCount": 3, "nextReview": "2024-01-20", "lastScore": 1
                }],
                "pendingSabaqi": { "surahNum": 2, "startIdx": 5, "endIdx": 10, "id": "2-5" },
                "startedAt": "2024-01-01"
            })
        );
    }

    #[test]
    fn empty_pending_is_written_as_null() {
        let progress = sample_progress().graduate_pending(date(2024, 1, 2));
        let value: Value = serde_json::from_str(&encode_progress(&progress).unwrap()).unwrap();
        assert_eq!(value["pendingSabaqi"], Value::Null);
    }

    #[test]
    fn decodes_record_written_before_review_fields_existed() {
        let raw = r#"{
            "currentSurah": 1,
            "currentAyahIdx": 0,
            "pendingSabaqi": null,
            "startedAt": "2024-03-01"
        }"#;
        let progress = decode_progress(raw).unwrap();
        assert!(progress.approved_portions().is_empty());

        let raw = r#"{
            "currentSurah": 2, "currentAyahIdx": 5,
            "approvedPortions": [{ "id": "2-0", "surahNum": 2, "startIdx": 0, "endIdx": 5,
                                   "nextReview": "2024-03-04" }],
            "pendingSabaqi": null, "startedAt": "2024-03-01"
        }"#;
        let progress = decode_progress(raw).unwrap();
        let portion = &progress.approved_portions()[0];
        assert_eq!(portion.review_count(), 0);
        assert_eq!(portion.last_score(), ReviewScore::Clean);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(decode_progress("not json").is_err());
        assert!(
            decode_progress(r#"{"currentSurah": 0, "currentAyahIdx": 0, "startedAt": "2024-01-01"}"#)
                .is_err()
        );
        assert!(
            decode_progress(
                r#"{"currentSurah": 2, "currentAyahIdx": 0, "startedAt": "2024-01-01",
                    "pendingSabaqi": {"surahNum": 2, "startIdx": 5, "endIdx": 5, "id": "2-5"}}"#
            )
            .is_err()
        );
        assert!(
            decode_progress(
                r#"{"currentSurah": 2, "currentAyahIdx": 0, "startedAt": "01/01/2024"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let progress = sample_progress();
        let decoded = decode_progress(&encode_progress(&progress).unwrap()).unwrap();
        assert_eq!(decoded, progress);
    }
}
