//! Bot command - poll Telegram and run scheduled sessions.

use crate::bot::Bot;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use tracing::info;

/// Run the bot until interrupted.
pub async fn run_bot(settings: Settings) -> Result<()> {
    preflight::check(Operation::Bot, &settings)?;

    let bot = Bot::new(&settings)?;

    Output::header("Wordcast Bot");
    Output::kv("Timezone", &settings.schedule.timezone);
    Output::kv(
        "Hours",
        &format!("{}:00-{}:59", settings.schedule.start_hour, settings.schedule.end_hour),
    );
    Output::kv("Words per session", &settings.session.words_per_session.to_string());
    if settings.telegram.allowed_user_ids.is_empty() {
        Output::warning("No allowed users (TG_IDS); /set, /add and /remove are refused for everyone");
    }
    println!();
    Output::success("Polling for updates. Send /set to the bot to start the schedule.");

    tokio::select! {
        result = bot.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            let cancelled = bot.scheduler().cancel().await;
            info!(cancelled, "Shutting down");
            Output::info("Stopped.");
        }
    }

    Ok(())
}
