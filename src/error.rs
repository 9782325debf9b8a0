//! Error types for Wordcast.

use thiserror::Error;

/// Library-level error type for Wordcast operations.
#[derive(Error, Debug)]
pub enum WordcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vocabulary source error: {0}")]
    Vocabulary(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Publishing failed: {0}")]
    Publish(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("Dictionary error: {0}")]
    Dictionary(String),

    #[error("Schedule error: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Wordcast operations.
pub type Result<T> = std::result::Result<T, WordcastError>;
