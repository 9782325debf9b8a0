//! Narration of the digest.

use super::SessionRunner;
use crate::error::{Result, WordcastError};
use crate::markdown::to_plain_text;
use crate::messaging::{ChatId, MessageHandle};
use tracing::{debug, instrument};

impl SessionRunner {
    /// Narrate the digest and deliver it with the session's words as caption.
    #[instrument(skip(self, digest_text, words))]
    pub async fn render_and_deliver_audio(
        &self,
        chat: ChatId,
        digest_text: &str,
        words: &[String],
    ) -> Result<MessageHandle> {
        self.narrate(chat, &to_plain_text(digest_text), &words.join(", "))
            .await
    }

    /// Synthesize `text` into a temporary MP3 and send it to `chat`.
    ///
    /// The temporary file is removed on every exit path.
    pub async fn narrate(&self, chat: ChatId, text: &str, caption: &str) -> Result<MessageHandle> {
        if text.trim().is_empty() {
            return Err(WordcastError::Tts("nothing to narrate".to_string()));
        }

        tokio::fs::create_dir_all(&self.config.temp_dir).await?;
        let audio = tempfile::Builder::new()
            .prefix("vocabulary-")
            .suffix(".mp3")
            .tempfile_in(&self.config.temp_dir)?;
        debug!(path = %audio.path().display(), "Narrating to temporary file");

        // `audio` is deleted when dropped, including on early return
        self.components
            .tts
            .synthesize(text, &self.config.voice, audio.path())
            .await?;
        let transport = &self.components.transport;
        let caption = truncate_caption(caption, transport.max_caption_len());
        let handle = transport.send_audio(chat, audio.path(), &caption).await?;

        audio.close()?;
        Ok(handle)
    }
}

/// Cut `caption` to `max_chars`, ending with an ellipsis when shortened.
fn truncate_caption(caption: &str, max_chars: usize) -> String {
    if caption.chars().count() <= max_chars {
        return caption.to_string();
    }
    let kept: String = caption.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
