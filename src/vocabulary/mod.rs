//! Remote vocabulary list access.

mod cached;
mod eudic;
mod memory;

pub use cached::CachedVocabulary;
pub use eudic::EudicSource;
pub use memory::MemoryVocabulary;

use crate::config::{Settings, VocabularyProvider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A saved word with its stored explanation (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub word: String,
    #[serde(default)]
    pub explanation_snippet: String,
}

impl VocabularyEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            explanation_snippet: String::new(),
        }
    }

    pub fn with_snippet(word: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            explanation_snippet: snippet.into(),
        }
    }
}

/// Trait for a saved-word list.
#[async_trait]
pub trait VocabularySource: Send + Sync {
    /// Fetch the full candidate list in the source's native order.
    ///
    /// An empty list is a valid answer, not an error.
    async fn list(&self) -> Result<Vec<VocabularyEntry>>;

    /// Add words, returning the service's acknowledgement.
    async fn add(&self, words: &[String]) -> Result<String>;

    /// Remove words, returning whether the service accepted the removal.
    async fn remove(&self, words: &[String]) -> Result<bool>;
}

/// Build the configured vocabulary source, wrapped in a cache when enabled.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn VocabularySource>> {
    let cfg = &settings.vocabulary;
    let source: Arc<dyn VocabularySource> = match cfg.provider {
        VocabularyProvider::Eudic => Arc::new(EudicSource::from_settings(cfg)?),
        VocabularyProvider::Memory => Arc::new(MemoryVocabulary::default()),
    };

    if cfg.cache_ttl_seconds == 0 {
        Ok(source)
    } else {
        Ok(Arc::new(CachedVocabulary::new(
            source,
            Duration::from_secs(cfg.cache_ttl_seconds),
        )))
    }
}
