//! Text-to-speech synthesis.

mod openai;

pub use openai::OpenAISpeech;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for a speech synthesizer.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Narrate `text` with `voice`, writing MP3 audio to `dest`.
    async fn synthesize(&self, text: &str, voice: &str, dest: &Path) -> Result<()>;
}

/// Split text into pieces of at most `max_chars` characters.
///
/// Pieces end at a sentence boundary when one is available, otherwise at
/// whitespace, otherwise mid-word.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while rest.chars().count() > max_chars {
        let limit = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        let window = &rest[..limit];

        let cut = window
            .rfind(|c| matches!(c, '.' | '!' | '?' | '\n'))
            .map(|i| i + 1)
            .or_else(|| window.rfind(char::is_whitespace))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        let piece = rest[..cut].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        rest = rest[cut..].trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}
