//! In-memory vocabulary list.
//!
//! Useful for testing and dry runs.

use super::{VocabularyEntry, VocabularySource};
use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-process word list.
#[derive(Default)]
pub struct MemoryVocabulary {
    entries: RwLock<Vec<VocabularyEntry>>,
}

impl MemoryVocabulary {
    pub fn new(entries: Vec<VocabularyEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Build a list from bare words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(words.into_iter().map(VocabularyEntry::new).collect())
    }
}

#[async_trait]
impl VocabularySource for MemoryVocabulary {
    async fn list(&self) -> Result<Vec<VocabularyEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn add(&self, words: &[String]) -> Result<String> {
        let mut entries = self.entries.write().await;
        let mut added = 0;
        for word in words {
            if !entries.iter().any(|e| e.word.eq_ignore_ascii_case(word)) {
                entries.push(VocabularyEntry::new(word.clone()));
                added += 1;
            }
        }
        Ok(format!("Added {} word(s)", added))
    }

    async fn remove(&self, words: &[String]) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !words.iter().any(|w| w.eq_ignore_ascii_case(&e.word)));
        Ok(entries.len() < before)
    }
}
