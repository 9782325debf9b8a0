//! Session command - run one review session immediately.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::messaging::{ChatId, ConsoleTransport, MessagingTransport, TelegramClient};
use crate::session::{SessionRunner, SessionState};
use anyhow::Result;
use std::sync::Arc;

/// Run a session for `chat`, or print it to the terminal with `dry_run`.
pub async fn run_session(chat: i64, dry_run: bool, settings: Settings) -> Result<()> {
    let transport: Arc<dyn MessagingTransport> = if dry_run {
        preflight::check(Operation::DryRun, &settings)?;
        Arc::new(ConsoleTransport::new(settings.telegram.max_message_len))
    } else {
        preflight::check(Operation::Session, &settings)?;
        if chat == 0 {
            anyhow::bail!("--chat is required unless --dry-run is given");
        }
        Arc::new(TelegramClient::from_settings(&settings.telegram)?)
    };

    std::fs::create_dir_all(settings.temp_dir())?;
    let runner = SessionRunner::new(&settings, transport)?;

    let session = if dry_run {
        runner.run_session(ChatId(chat)).await
    } else {
        let spinner = Output::spinner(&format!("Running session for chat {}...", chat));
        let session = runner.run_session(ChatId(chat)).await;
        spinner.finish_and_clear();
        session
    };

    Output::session_summary(&session);
    if let SessionState::Failed(reason) = session.final_state() {
        anyhow::bail!("session failed: {}", reason);
    }
    Ok(())
}
