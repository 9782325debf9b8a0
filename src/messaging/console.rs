//! Transport that prints to the terminal, for dry runs.

use super::{ChatId, MessageHandle, MessagingTransport, OutgoingMessage, TextFormat};
use crate::error::Result;
use crate::markdown::strip_html;
use async_trait::async_trait;
use console::style;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

/// Writes every message to stdout instead of a chat.
pub struct ConsoleTransport {
    next_id: AtomicI64,
    max_message_len: usize,
}

impl ConsoleTransport {
    pub fn new(max_message_len: usize) -> Self {
        Self {
            next_id: AtomicI64::new(1),
            max_message_len,
        }
    }

    fn next_handle(&self) -> MessageHandle {
        MessageHandle {
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[async_trait]
impl MessagingTransport for ConsoleTransport {
    fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    async fn send_text(&self, chat: ChatId, message: &OutgoingMessage) -> Result<MessageHandle> {
        let handle = self.next_handle();
        let reply = message
            .reply_to
            .map(|h| format!(" ↳ #{}", h.message_id))
            .unwrap_or_default();
        println!(
            "{}",
            style(format!("── [{}] #{}{}", chat, handle.message_id, reply)).dim()
        );

        match message.format {
            TextFormat::Html => println!("{}", strip_html(&message.text)),
            TextFormat::Plain => println!("{}", message.text),
        }
        if let Some(word) = &message.delete_word {
            println!("{}", style(format!("[Delete {}]", word)).cyan());
        }
        println!();
        Ok(handle)
    }

    async fn send_audio(&self, chat: ChatId, file: &Path, caption: &str) -> Result<MessageHandle> {
        let handle = self.next_handle();
        let size = std::fs::metadata(file)?.len();
        println!(
            "{}",
            style(format!("── [{}] #{} audio", chat, handle.message_id)).dim()
        );
        println!("🔊 {} ({} bytes)\n{}\n", file.display(), size, caption);
        Ok(handle)
    }
}
