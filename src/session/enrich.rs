//! Per-word enrichment: links message plus a threaded explanation.

use super::{EnrichmentResult, SessionRunner};
use crate::error::Result;
use crate::links::compose_links;
use crate::markdown::{collapse_blank_lines, to_telegram_html, truncate_html};
use crate::messaging::{ChatId, MessageHandle, OutgoingMessage};
use crate::vocabulary::VocabularyEntry;
use tracing::{error, instrument};

/// Markdown for the links message of one word.
pub(crate) fn links_message(heading: &str, snippet: &str, dictionary_text: &str, links: &str) -> String {
    [format!("**{}**", heading), snippet.to_string(), dictionary_text.to_string(), links.to_string()]
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl SessionRunner {
    /// Deliver the links message and the explanation for the `index`-th word.
    ///
    /// Failures are reported to `chat` and recorded in the result.
    #[instrument(skip(self, entry), fields(word = %entry.word))]
    pub async fn enrich_and_deliver(
        &self,
        chat: ChatId,
        index: usize,
        entry: &VocabularyEntry,
    ) -> EnrichmentResult {
        let heading = format!("{}. {}", index, entry.word);
        let links_text = compose_links(&entry.word);
        let mut result = EnrichmentResult {
            word: entry.word.clone(),
            links_text: links_text.clone(),
            explanation_text: None,
            error: None,
        };

        match self
            .deliver_word(chat, &heading, entry, &links_text, None)
            .await
        {
            Ok(explanation) => result.explanation_text = Some(explanation),
            Err(e) => {
                error!(error = %e, "Enrichment failed");
                self.notify(chat, format!("explain {} failed: {}", entry.word, e))
                    .await;
                result.error = Some(e.to_string());
            }
        }
        result
    }

    /// Answer a lookup request with the same two messages a session sends.
    pub async fn define(&self, chat: ChatId, word: &str, reply_to: Option<MessageHandle>) -> Result<String> {
        let entry = VocabularyEntry::new(word);
        self.deliver_word(chat, word, &entry, &compose_links(word), reply_to)
            .await
    }

    async fn deliver_word(
        &self,
        chat: ChatId,
        heading: &str,
        entry: &VocabularyEntry,
        links_text: &str,
        reply_to: Option<MessageHandle>,
    ) -> Result<String> {
        let transport = &self.components.transport;
        let limit = transport.max_message_len();
        let dictionary_text = self.components.dictionary.lookup(&entry.word);

        let markdown = links_message(heading, &entry.explanation_snippet, &dictionary_text, links_text);
        let html = collapse_blank_lines(&to_telegram_html(&markdown));
        let mut links = OutgoingMessage::html(truncate_html(&html, limit));
        if let Some(handle) = reply_to {
            links = links.reply_to(handle);
        }
        let handle = transport.send_text(chat, &links).await?;

        let explanation = self
            .components
            .llm
            .complete(
                &self.prompts.explanation_system(),
                &self.prompts.explanation_user(&entry.word, &dictionary_text),
            )
            .await?;

        let reply = OutgoingMessage::html(truncate_html(&to_telegram_html(&explanation), limit))
            .reply_to(handle)
            .with_delete_button(entry.word.clone());
        transport.send_text(chat, &reply).await?;

        Ok(explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::Harness;

    #[test]
    fn test_links_message_skips_empty_parts() {
        assert_eq!(
            links_message("1. snug", "", "  ", "[a](b)"),
            "**1. snug**\n\n[a](b)"
        );
        assert_eq!(
            links_message("2. lean", "v. incline", "dict", "[a](b)"),
            "**2. lean**\n\nv. incline\n\ndict\n\n[a](b)"
        );
    }

    #[tokio::test]
    async fn test_links_message_is_truncated() {
        let harness = Harness::with_max_len(["snug"], 200);
        let result = harness
            .runner
            .enrich_and_deliver(ChatId(1), 1, &VocabularyEntry::with_snippet("snug", "x".repeat(500)))
            .await;

        assert!(result.error.is_none());
        for message in harness.transport.texts() {
            assert!(message.text.chars().count() <= 200);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported() {
        let harness = Harness::new(["snug"]);
        harness.transport.fail_text_containing("snug</b>");
        let result = harness
            .runner
            .enrich_and_deliver(ChatId(1), 1, &VocabularyEntry::new("snug"))
            .await;

        assert!(result.error.is_some());
        assert!(harness.chat.calls().is_empty());
        let texts = harness.transport.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].text.starts_with("explain snug failed"));
    }

    #[tokio::test]
    async fn test_define_replies_to_request() {
        let harness = Harness::new(["snug"]);
        let request = MessageHandle { message_id: 99 };
        harness
            .runner
            .define(ChatId(1), "lean", Some(request))
            .await
            .unwrap();

        let texts = harness.transport.texts();
        assert_eq!(texts[0].reply_to, Some(request));
        assert!(texts[0].text.contains("<b>lean</b>"));
        assert_eq!(texts[1].delete_word.as_deref(), Some("lean"));
    }
}
