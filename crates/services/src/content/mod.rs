mod alquran;

use async_trait::async_trait;

use tarteel_core::model::{PortionRange, SurahNumber};

use crate::error::ContentError;

pub use alquran::AlQuranCloudLoader;

/// Base URL of the per-verse Alafasy recitation files.
pub const AUDIO_BASE_URL: &str = "https://cdn.islamic.network/quran/audio/128/ar.alafasy";

//
// ─── VERSES ────────────────────────────────────────────────────────────────────
//

/// One verse with its translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    /// Position across the whole Quran, 1..=6236.
    pub number: u32,
    pub number_in_surah: u32,
    pub arabic: String,
    pub english: String,
}

impl Verse {
    /// Recitation audio for this verse.
    #[must_use]
    pub fn audio_url(&self) -> String {
        format!("{AUDIO_BASE_URL}/{}.mp3", self.number)
    }
}

/// Full text of a surah in both editions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurahText {
    pub surah: SurahNumber,
    pub arabic_name: String,
    pub english_name: String,
    pub verses: Vec<Verse>,
}

impl SurahText {
    /// Cuts the verses covered by `range` out of the full surah.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::OutOfRange` if the range reaches past the last
    /// verse.
    pub fn slice(&self, range: &PortionRange) -> Result<PortionContent, ContentError> {
        let out_of_range = || ContentError::OutOfRange {
            surah: range.surah(),
            end: range.end(),
            available: self.verses.len(),
        };
        let start = usize::try_from(range.start()).map_err(|_| out_of_range())?;
        let end = usize::try_from(range.end()).map_err(|_| out_of_range())?;
        let verses = self.verses.get(start..end).ok_or_else(out_of_range)?;

        Ok(PortionContent {
            range: range.clone(),
            surah_arabic_name: self.arabic_name.clone(),
            surah_english_name: self.english_name.clone(),
            verses: verses.to_vec(),
        })
    }
}

/// Verse content resolved for one portion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortionContent {
    pub range: PortionRange,
    pub surah_arabic_name: String,
    pub surah_english_name: String,
    pub verses: Vec<Verse>,
}

//
// ─── LOADER ────────────────────────────────────────────────────────────────────
//

/// Source of verse text for a portion.
#[async_trait]
pub trait PortionLoader: Send + Sync {
    /// Loads the Arabic and English verses covered by `range`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when the provider is unreachable or the range
    /// does not fit the surah it returned.
    async fn load_portion(&self, range: &PortionRange) -> Result<PortionContent, ContentError>;
}
