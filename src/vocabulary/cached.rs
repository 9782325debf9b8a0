//! Time-bounded cache over a vocabulary source.

use super::{VocabularyEntry, VocabularySource};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Caches `list` results for a fixed time-to-live.
///
/// Any `add` or `remove` drops the cached list.
pub struct CachedVocabulary {
    inner: Arc<dyn VocabularySource>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, Vec<VocabularyEntry>)>>,
}

impl CachedVocabulary {
    pub fn new(inner: Arc<dyn VocabularySource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }

    async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

#[async_trait]
impl VocabularySource for CachedVocabulary {
    async fn list(&self) -> Result<Vec<VocabularyEntry>> {
        let mut cached = self.cached.lock().await;
        if let Some((at, entries)) = cached.as_ref() {
            if at.elapsed() < self.ttl {
                debug!(count = entries.len(), "Vocabulary cache hit");
                return Ok(entries.clone());
            }
        }

        let entries = self.inner.list().await?;
        *cached = Some((Instant::now(), entries.clone()));
        Ok(entries)
    }

    async fn add(&self, words: &[String]) -> Result<String> {
        let ack = self.inner.add(words).await?;
        self.invalidate().await;
        Ok(ack)
    }

    async fn remove(&self, words: &[String]) -> Result<bool> {
        let removed = self.inner.remove(words).await?;
        self.invalidate().await;
        Ok(removed)
    }
}
