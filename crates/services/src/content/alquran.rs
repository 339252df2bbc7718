use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use tarteel_core::model::{PortionRange, SurahNumber};
use tarteel_core::quran::{SurahCatalog, SurahMeta};

use super::{PortionContent, PortionLoader, SurahText, Verse};
use crate::error::ContentError;

const DEFAULT_BASE_URL: &str = "https://api.alquran.cloud/v1";
const ARABIC_EDITION: &str = "quran-uthmani";
const ENGLISH_EDITION: &str = "en.sahih";

/// `PortionLoader` backed by the public alquran.cloud API.
///
/// Whole surahs are fetched once per loader and sliced locally.
#[derive(Clone)]
pub struct AlQuranCloudLoader {
    client: Client,
    base_url: String,
    cache: Arc<Mutex<HashMap<SurahNumber, Arc<SurahText>>>>,
}

impl Default for AlQuranCloudLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AlQuranCloudLoader {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Uses `TARTEEL_CONTENT_URL` when set, the public endpoint otherwise.
    #[must_use]
    pub fn from_env() -> Self {
        match env::var("TARTEEL_CONTENT_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches names and verse counts of all surahs.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when the request fails or an entry carries an
    /// invalid surah number.
    pub async fn surah_list(&self) -> Result<SurahCatalog, ContentError> {
        let body: ApiEnvelope<Vec<ApiSurahSummary>> = self.get("surah").await?;
        catalog_from(body.data)
    }

    /// Fetches both editions of `surah`, reusing an earlier fetch if any.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when either request fails or the editions
    /// disagree on the verse count.
    pub async fn surah_text(&self, surah: SurahNumber) -> Result<Arc<SurahText>, ContentError> {
        if let Some(cached) = self.cached(surah) {
            return Ok(cached);
        }

        let arabic: ApiEnvelope<ApiSurahEdition> = self
            .get(&format!("surah/{surah}/{ARABIC_EDITION}"))
            .await?;
        let english: ApiEnvelope<ApiSurahEdition> = self
            .get(&format!("surah/{surah}/{ENGLISH_EDITION}"))
            .await?;
        let (arabic, english) = (arabic.data, english.data);

        if arabic.ayahs.is_empty() {
            return Err(ContentError::EmptyResponse(format!("surah {surah}")));
        }
        if arabic.ayahs.len() != english.ayahs.len() {
            return Err(ContentError::EditionMismatch(surah));
        }

        let verses = arabic
            .ayahs
            .into_iter()
            .zip(english.ayahs)
            .map(|(ar, en)| Verse {
                number: ar.number,
                number_in_surah: ar.number_in_surah,
                arabic: ar.text,
                english: en.text,
            })
            .collect();

        let text = Arc::new(SurahText {
            surah,
            arabic_name: arabic.name,
            english_name: arabic.english_name,
            verses,
        });
        match self.cache.lock() {
            Ok(mut cache) => {
                cache.insert(surah, Arc::clone(&text));
            }
            Err(err) => {
                tracing::warn!(%surah, error = %err, "surah cache lock poisoned; not caching");
            }
        }
        Ok(text)
    }

    fn cached(&self, surah: SurahNumber) -> Option<Arc<SurahText>> {
        match self.cache.lock() {
            Ok(cache) => cache.get(&surah).cloned(),
            Err(err) => {
                tracing::warn!(%surah, error = %err, "surah cache lock poisoned; fetching again");
                None
            }
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ContentError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PortionLoader for AlQuranCloudLoader {
    async fn load_portion(&self, range: &PortionRange) -> Result<PortionContent, ContentError> {
        let text = self.surah_text(range.surah()).await?;
        text.slice(range)
    }
}

fn catalog_from(entries: Vec<ApiSurahSummary>) -> Result<SurahCatalog, ContentError> {
    if entries.is_empty() {
        return Err(ContentError::EmptyResponse("surah list".into()));
    }

    let mut surahs = Vec::with_capacity(entries.len());
    for entry in entries {
        let number =
            SurahNumber::new(entry.number).map_err(|_| ContentError::InvalidSurah(entry.number))?;
        surahs.push(SurahMeta {
            number,
            verse_count: entry.number_of_ayahs,
            arabic_name: entry.name,
            english_name: entry.english_name,
        });
    }
    Ok(SurahCatalog::new(surahs))
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSurahSummary {
    number: u32,
    name: String,
    english_name: String,
    number_of_ayahs: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSurahEdition {
    name: String,
    english_name: String,
    ayahs: Vec<ApiAyah>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAyah {
    number: u32,
    number_in_surah: u32,
    text: String,
}
