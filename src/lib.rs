//! Wordcast - vocabulary review digests over Telegram
//!
//! Pulls words from a study list on a daily schedule, sends reference links
//! and an explanation for each, publishes a short essay that uses all of them
//! and delivers a narrated recording of it.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `vocabulary` - Word list sources (Eudic, in-memory, cached)
//! - `selection` - Picking the words for a session
//! - `links` - Dictionary and pronunciation links for a word
//! - `markdown` - Rendering model output for Telegram, Telegraph and speech
//! - `llm`, `tts`, `publish`, `messaging`, `dictionary` - External collaborators
//! - `session` - The review pipeline
//! - `scheduler` - Daily triggers
//! - `bot` - Telegram command handling
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wordcast::config::Settings;
//! use wordcast::messaging::{ChatId, ConsoleTransport};
//! use wordcast::session::SessionRunner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let runner = SessionRunner::new(&settings, Arc::new(ConsoleTransport::default()))?;
//!
//!     let session = runner.run_session(ChatId(0)).await;
//!     println!("Reviewed {} words", session.words().len());
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod links;
pub mod llm;
pub mod markdown;
pub mod messaging;
pub mod openai;
pub mod publish;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod tts;
pub mod vocabulary;

pub use error::{Result, WordcastError};
