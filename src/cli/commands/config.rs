//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
///
/// `path` is the `--config` override, if any.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<PathBuf>) -> Result<()> {
    let config_path = path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                Output::warning(&format!("Config already exists at {}", config_path.display()));
                Output::info("Use --force to overwrite it.");
                return Ok(());
            }
            // Secrets stay in the environment
            Settings::default().save_to(&config_path)?;
            Output::success(&format!("Created config file: {}", config_path.display()));
        }
    }

    Ok(())
}

/// Hide secrets before printing.
fn redacted(mut settings: Settings) -> Settings {
    let hide = |value: &mut Option<String>| {
        if value.is_some() {
            *value = Some("<redacted>".to_string());
        }
    };
    hide(&mut settings.telegram.bot_token);
    hide(&mut settings.vocabulary.token);
    hide(&mut settings.llm.api_key);
    hide(&mut settings.tts.api_key);
    hide(&mut settings.publish.access_token);
    settings
}
