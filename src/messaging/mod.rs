//! Outbound messaging.

mod console;
mod telegram;

pub use console::ConsoleTransport;
pub use telegram::{CallbackQuery, Chat, Message, TelegramClient, Update, User, DELETE_PREFIX};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Destination chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a delivered message, used for threaded replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub message_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// A text message ready for delivery.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub format: TextFormat,
    pub reply_to: Option<MessageHandle>,
    /// Word offered for removal through an inline button.
    pub delete_word: Option<String>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Html,
            ..Self::default()
        }
    }

    pub fn reply_to(mut self, handle: MessageHandle) -> Self {
        self.reply_to = Some(handle);
        self
    }

    pub fn with_delete_button(mut self, word: impl Into<String>) -> Self {
        self.delete_word = Some(word.into());
        self
    }
}

/// Telegram's limit for media captions, in characters.
pub const MAX_CAPTION_LEN: usize = 1024;

/// Trait for a chat transport.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Largest text payload the transport accepts, in characters.
    fn max_message_len(&self) -> usize;

    /// Largest audio caption the transport accepts, in characters.
    fn max_caption_len(&self) -> usize {
        MAX_CAPTION_LEN
    }

    async fn send_text(&self, chat: ChatId, message: &OutgoingMessage) -> Result<MessageHandle>;

    async fn send_audio(&self, chat: ChatId, file: &Path, caption: &str) -> Result<MessageHandle>;
}
