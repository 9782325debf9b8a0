//! Digest essay composition and publishing.

use super::{DigestArtifact, SessionRunner};
use crate::error::Result;
use crate::markdown::{normalize, to_nodes};
use crate::messaging::ChatId;
use crate::publish::Page;
use chrono::Local;
use tracing::{error, info, instrument, warn};

/// Words that do not occur in `text` (case-insensitive substring match).
pub fn missing_words(text: &str, words: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut missing: Vec<String> = Vec::new();
    for word in words {
        if !haystack.contains(&word.to_lowercase()) && !missing.contains(word) {
            missing.push(word.clone());
        }
    }
    missing
}

impl SessionRunner {
    /// Write an essay using every word, then publish it.
    ///
    /// Only essay generation can fail; a publishing failure is reported to
    /// `chat` and leaves `published_url` empty.
    #[instrument(skip(self, words), fields(words = words.len()))]
    pub async fn compose_digest(&self, chat: ChatId, words: &[String]) -> Result<DigestArtifact> {
        let essay = self.write_essay(words).await?;
        let title = format!(
            "{} - {}",
            self.config.title_prefix,
            Local::now().format("%Y-%m-%d %H:%M")
        );
        let published_url = self.publish_markdown(chat, &title, &essay).await;

        Ok(DigestArtifact {
            markdown_body: essay,
            published_url,
            audio_caption: words.join(", "),
        })
    }

    async fn write_essay(&self, words: &[String]) -> Result<String> {
        let llm = &self.components.llm;
        let system = self.prompts.writer_system();

        let mut essay = llm.complete(&system, &self.prompts.writer_user(words)).await?;
        let mut missing = missing_words(&essay, words);
        if missing.is_empty() {
            return Ok(essay);
        }

        info!(missing = ?missing, "Essay left out words, asking again");
        match llm
            .complete(&system, &self.prompts.writer_retry(words, &missing))
            .await
        {
            Ok(second) => {
                let still_missing = missing_words(&second, words);
                if still_missing.len() < missing.len() {
                    essay = second;
                    missing = still_missing;
                }
            }
            Err(e) => warn!(error = %e, "Essay retry failed, keeping first draft"),
        }

        if !missing.is_empty() {
            warn!(missing = ?missing, "Essay does not use every word");
        }
        Ok(essay)
    }

    /// Publish Markdown, retrying once with normalized input.
    ///
    /// Returns the page URL, or `None` after reporting the failure to `chat`.
    pub async fn publish_markdown(&self, chat: ChatId, title: &str, markdown: &str) -> Option<String> {
        let publisher = &self.components.publisher;

        let first = match publisher.publish(&Page::new(title, to_nodes(markdown))).await {
            Ok(url) => return Some(url),
            Err(e) => e,
        };
        warn!(error = %first, "Publish failed, retrying with normalized markdown");

        match publisher
            .publish(&Page::new(title, to_nodes(&normalize(markdown))))
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                error!(error = %e, "Publish retry failed");
                self.notify(chat, format!("publish failed: {}", e)).await;
                None
            }
        }
    }
}
