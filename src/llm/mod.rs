//! Chat completion backends.

mod openai;

pub use openai::OpenAIChat;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for a single-turn chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete `user` under the `system` instruction.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}
