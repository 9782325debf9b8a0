//! Configuration module for Wordcast.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ExplanationPrompts, Prompts, WriterPrompts};
pub use settings::{
    DictionarySettings, GeneralSettings, LlmSettings, PromptSettings, PublishSettings,
    ScheduleSettings, SessionConfig, SessionSettings, Settings, TelegramSettings, TtsSettings,
    VocabularyProvider, VocabularySettings,
};
