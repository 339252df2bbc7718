//! Surah metadata lookups.
//!
//! Session building needs the verse count of the learner's current surah. The
//! lookup sits behind [`SurahIndex`] so callers can use the bundled table or a
//! catalog fetched from a content provider.

use crate::model::SurahNumber;

/// Verse counts of the 114 surahs, in order (Hafs numbering, 6236 verses).
pub const VERSE_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Descriptive metadata for one surah.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurahMeta {
    pub number: SurahNumber,
    pub verse_count: u32,
    pub arabic_name: String,
    pub english_name: String,
}

/// Source of surah verse counts.
pub trait SurahIndex: Send + Sync {
    /// Number of verses in `surah`, or `None` when the index does not know it.
    fn verse_count(&self, surah: SurahNumber) -> Option<u32>;
}

/// Index backed by the bundled [`VERSE_COUNTS`] table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSurahIndex;

impl SurahIndex for StaticSurahIndex {
    fn verse_count(&self, surah: SurahNumber) -> Option<u32> {
        VERSE_COUNTS.get(surah.index()).copied().map(u32::from)
    }
}

/// Index over a fetched surah list.
#[derive(Debug, Clone, Default)]
pub struct SurahCatalog {
    surahs: Vec<SurahMeta>,
}

impl SurahCatalog {
    #[must_use]
    pub fn new(surahs: Vec<SurahMeta>) -> Self {
        Self { surahs }
    }

    #[must_use]
    pub fn get(&self, surah: SurahNumber) -> Option<&SurahMeta> {
        self.surahs.iter().find(|meta| meta.number == surah)
    }

    #[must_use]
    pub fn surahs(&self) -> &[SurahMeta] {
        &self.surahs
    }
}

impl SurahIndex for SurahCatalog {
    fn verse_count(&self, surah: SurahNumber) -> Option<u32> {
        self.get(surah).map(|meta| meta.verse_count)
    }
}
