//! Configuration settings for Wordcast.

use crate::selection::SelectionStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub telegram: TelegramSettings,
    pub vocabulary: VocabularySettings,
    pub llm: LlmSettings,
    pub tts: TtsSettings,
    pub publish: PublishSettings,
    pub dictionary: DictionarySettings,
    pub session: SessionSettings,
    pub schedule: ScheduleSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary audio files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/wordcast".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot token issued by BotFather.
    pub bot_token: Option<String>,
    /// Bot API base URL.
    pub api_base: String,
    /// Users allowed to run privileged commands.
    pub allowed_user_ids: Vec<i64>,
    /// Maximum characters per outgoing message.
    pub max_message_len: usize,
    /// Long-polling timeout for getUpdates.
    pub poll_timeout_seconds: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: "https://api.telegram.org".to_string(),
            allowed_user_ids: Vec::new(),
            max_message_len: 4096,
            poll_timeout_seconds: 30,
        }
    }
}

/// Vocabulary provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VocabularyProvider {
    /// Eudic study list over HTTP.
    #[default]
    Eudic,
    /// In-process list, empty at start.
    Memory,
}

impl std::str::FromStr for VocabularyProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eudic" | "frdic" => Ok(VocabularyProvider::Eudic),
            "memory" => Ok(VocabularyProvider::Memory),
            _ => Err(format!("Unknown vocabulary provider: {}", s)),
        }
    }
}

impl std::fmt::Display for VocabularyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VocabularyProvider::Eudic => write!(f, "eudic"),
            VocabularyProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Remote vocabulary store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularySettings {
    pub provider: VocabularyProvider,
    /// Eudic open API base URL.
    pub api_base: String,
    /// Eudic authorization token.
    pub token: Option<String>,
    /// Study list identifier.
    pub list_id: String,
    /// Study list language.
    pub language: String,
    /// How long a fetched list stays cached (0 disables caching).
    pub cache_ttl_seconds: u64,
}

impl Default for VocabularySettings {
    fn default() -> Self {
        Self {
            provider: VocabularyProvider::Eudic,
            api_base: "https://api.frdic.com".to_string(),
            token: None,
            list_id: "0".to_string(),
            language: "en".to_string(),
            cache_ttl_seconds: 7200,
        }
    }
}

/// Chat model settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Override for the API base URL (e.g. a Groq or local endpoint).
    pub api_base: Option<String>,
    /// API key; falls back to OPENAI_API_KEY.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Request timeout.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 8000,
            timeout_seconds: 300,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    /// Speech model (tts-1, tts-1-hd).
    pub model: String,
    /// Voice name (alloy, echo, fable, onyx, nova, shimmer).
    pub voice: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
        }
    }
}

/// Telegraph publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub api_base: String,
    /// Existing account token; an anonymous account is created when absent.
    pub access_token: Option<String>,
    pub short_name: String,
    /// Page titles are "<prefix> - <timestamp>".
    pub title_prefix: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegra.ph".to_string(),
            access_token: None,
            short_name: "anonymous".to_string(),
            title_prefix: "Glossary".to_string(),
        }
    }
}

/// Local dictionary settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DictionarySettings {
    /// Path to a `word<TAB>definition` file.
    pub path: Option<String>,
}

/// Review session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Number of words per session.
    pub words_per_session: usize,
    /// Pause after each word, in seconds.
    pub message_interval_seconds: f64,
    /// Selection policy.
    pub selection: SelectionStrategy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            words_per_session: 15,
            message_interval_seconds: 3.0,
            selection: SelectionStrategy::default(),
        }
    }
}

/// Daily schedule settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// IANA timezone name.
    pub timezone: String,
    /// First hour with a run (inclusive).
    pub start_hour: u32,
    /// Last hour with a run (inclusive).
    pub end_hour: u32,
    pub minute_min: u32,
    pub minute_max: u32,
    /// Delay before the immediate run that follows /set.
    pub initial_delay_seconds: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            timezone: "Asia/Shanghai".to_string(),
            start_hour: 9,
            end_hour: 21,
            minute_min: 15,
            minute_max: 55,
            initial_delay_seconds: 1,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// Explicit configuration handed to the session runner.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub words_per_session: usize,
    pub message_interval: Duration,
    pub selection: SelectionStrategy,
    pub max_message_len: usize,
    pub voice: String,
    pub title_prefix: String,
    pub temp_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Settings::default().session_config()
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment variables override secrets found in the file.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply environment overrides using the given lookup function.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::error::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TG_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(ids) = non_empty("TG_IDS") {
            self.telegram.allowed_user_ids = parse_user_ids(&ids)?;
        }
        if let Some(token) = non_empty("EUDIC_TOKEN") {
            self.vocabulary.token = Some(token);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key.get_or_insert(key.clone());
            self.tts.api_key.get_or_insert(key);
        }
        if let Some(base) = non_empty("OPENAI_BASE_URL") {
            self.llm.api_base = Some(base);
        }
        if let Some(token) = non_empty("TELEGRAPH_ACCESS_TOKEN") {
            self.publish.access_token = Some(token);
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::WordcastError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordcast")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded dictionary path, if configured.
    pub fn dictionary_path(&self) -> Option<PathBuf> {
        self.dictionary.path.as_deref().map(Self::expand_path)
    }

    /// Build the configuration consumed by the session runner.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            words_per_session: self.session.words_per_session,
            message_interval: Duration::from_secs_f64(self.session.message_interval_seconds.max(0.0)),
            selection: self.session.selection,
            max_message_len: self.telegram.max_message_len,
            voice: self.tts.voice.clone(),
            title_prefix: self.publish.title_prefix.clone(),
            temp_dir: self.temp_dir(),
        }
    }

    /// Check whether a Telegram user may run privileged commands.
    pub fn is_allowed_user(&self, user_id: i64) -> bool {
        self.telegram.allowed_user_ids.contains(&user_id)
    }
}

fn parse_user_ids(raw: &str) -> crate::error::Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| crate::error::WordcastError::Config(format!("TG_IDS: '{}': {}", s, e)))
        })
        .collect()
}
