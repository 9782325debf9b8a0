//! Eudic study-list client.

use super::{VocabularyEntry, VocabularySource};
use crate::config::VocabularySettings;
use crate::error::{Result, WordcastError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const WORDS_PATH: &str = "/api/open/v1/studylist/words";
const BROWSER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Option<Vec<WordDto>>,
}

#[derive(Debug, Deserialize)]
struct WordDto {
    word: String,
    #[serde(default)]
    exp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct WordsBody<'a> {
    id: &'a str,
    language: &'a str,
    words: &'a [String],
}

/// Client for the Eudic open API study list.
pub struct EudicSource {
    client: reqwest::Client,
    api_base: String,
    list_id: String,
    language: String,
}

impl EudicSource {
    /// Create a client for the given API base and access token.
    pub fn new(api_base: &str, token: &str, list_id: &str, language: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(token)
                .map_err(|e| WordcastError::Config(format!("Invalid Eudic token: {}", e)))?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            list_id: list_id.to_string(),
            language: language.to_string(),
        })
    }

    pub fn from_settings(settings: &VocabularySettings) -> Result<Self> {
        let token = settings
            .token
            .as_deref()
            .ok_or_else(|| WordcastError::Config("Eudic token not configured (EUDIC_TOKEN)".to_string()))?;
        Self::new(&settings.api_base, token, &settings.list_id, &settings.language)
    }

    fn words_url(&self) -> String {
        format!("{}{}", self.api_base, WORDS_PATH)
    }

    fn body<'a>(&'a self, words: &'a [String]) -> WordsBody<'a> {
        WordsBody {
            id: &self.list_id,
            language: &self.language,
            words,
        }
    }
}

#[async_trait]
impl VocabularySource for EudicSource {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<VocabularyEntry>> {
        let url = format!("{}/{}", self.words_url(), self.list_id);
        let response = self
            .client
            .get(&url)
            .query(&[("language", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordcastError::Vocabulary(format!(
                "List request failed with status {}",
                status
            )));
        }

        let body: ListResponse = response.json().await?;
        let entries: Vec<VocabularyEntry> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|w| {
                let word = w.word.trim();
                (!word.is_empty())
                    .then(|| VocabularyEntry::with_snippet(word, w.exp.unwrap_or_default()))
            })
            .collect();

        debug!(count = entries.len(), "Fetched vocabulary list");
        Ok(entries)
    }

    #[instrument(skip(self), fields(count = words.len()))]
    async fn add(&self, words: &[String]) -> Result<String> {
        let response = self
            .client
            .post(self.words_url())
            .json(&self.body(words))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WordcastError::Vocabulary(format!(
                "Add request failed with status {}",
                status
            )));
        }

        let ack: AckResponse = response.json().await.unwrap_or(AckResponse { message: None });
        Ok(ack
            .message
            .unwrap_or_else(|| format!("Added {} word(s)", words.len())))
    }

    #[instrument(skip(self), fields(count = words.len()))]
    async fn remove(&self, words: &[String]) -> Result<bool> {
        let response = self
            .client
            .delete(self.words_url())
            .json(&self.body(words))
            .send()
            .await?;

        debug!(status = %response.status(), "Remove request finished");
        Ok(response.status().is_success())
    }
}
