//! Pre-flight checks before starting long-running work.
//!
//! Validates that the credentials an operation needs are configured so it
//! fails at startup instead of on the first scheduled session.

use crate::config::{Settings, VocabularyProvider};
use crate::error::{Result, WordcastError};
use crate::scheduler::parse_timezone;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// The bot needs everything a session needs plus the Telegram token.
    Bot,
    /// A session delivering to Telegram.
    Session,
    /// A session printed to the terminal.
    DryRun,
    /// Reading or editing the vocabulary list.
    Words,
    /// Explaining a single word.
    Define,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Bot => {
            check_telegram(settings)?;
            check_vocabulary(settings)?;
            check_llm(settings)?;
            parse_timezone(&settings.schedule.timezone)?;
        }
        Operation::Session => {
            check_telegram(settings)?;
            check_vocabulary(settings)?;
            check_llm(settings)?;
        }
        Operation::DryRun => {
            check_vocabulary(settings)?;
            check_llm(settings)?;
        }
        Operation::Words => check_vocabulary(settings)?,
        Operation::Define => check_llm(settings)?,
    }
    Ok(())
}

fn configured(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn check_telegram(settings: &Settings) -> Result<()> {
    if configured(&settings.telegram.bot_token) {
        Ok(())
    } else {
        Err(WordcastError::Config(
            "Telegram bot token not set. Set it with: export TG_BOT_TOKEN='123:abc'".to_string(),
        ))
    }
}

fn check_vocabulary(settings: &Settings) -> Result<()> {
    match settings.vocabulary.provider {
        VocabularyProvider::Eudic if !configured(&settings.vocabulary.token) => {
            Err(WordcastError::Config(
                "Eudic token not set. Set it with: export EUDIC_TOKEN='NIS ...'".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn check_llm(settings: &Settings) -> Result<()> {
    // Self-hosted compatible endpoints may not need a key
    if configured(&settings.llm.api_key) || settings.llm.api_base.is_some() {
        Ok(())
    } else {
        Err(WordcastError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> Settings {
        let mut settings = Settings::default();
        settings.vocabulary.provider = VocabularyProvider::Memory;
        settings
    }

    #[test]
    fn test_words_with_memory_provider_needs_nothing() {
        assert!(check(Operation::Words, &memory_settings()).is_ok());
    }

    #[test]
    fn test_bot_requires_telegram_token() {
        let mut settings = memory_settings();
        settings.llm.api_key = Some("sk-test".to_string());
        assert!(matches!(
            check(Operation::Bot, &settings),
            Err(WordcastError::Config(msg)) if msg.contains("TG_BOT_TOKEN")
        ));

        settings.telegram.bot_token = Some("123:abc".to_string());
        assert!(check(Operation::Bot, &settings).is_ok());
        assert!(check(Operation::DryRun, &settings).is_ok());
    }

    #[test]
    fn test_eudic_requires_token() {
        let mut settings = Settings::default();
        settings.vocabulary.provider = VocabularyProvider::Eudic;
        settings.vocabulary.token = Some("  ".to_string());
        assert!(check(Operation::Words, &settings).is_err());
    }
}
