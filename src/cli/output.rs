//! CLI output formatting utilities.

use crate::session::{Session, SessionState};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a vocabulary entry with a preview of its explanation.
    pub fn word(word: &str, snippet: &str) {
        if snippet.trim().is_empty() {
            Self::list_item(&style(word).bold().to_string());
        } else {
            println!(
                "  {} {} {}",
                style("*").cyan(),
                style(word).bold(),
                style(preview(snippet, 60)).dim()
            );
        }
    }

    /// Print what a session did.
    pub fn session_summary(session: &Session) {
        Self::header("Session");
        Self::kv("Id", &session.id.to_string());
        Self::kv("Chat", &session.destination.to_string());
        Self::kv("Words", &session.words().join(", "));

        let explained = session
            .enrichments
            .iter()
            .filter(|e| e.error.is_none())
            .count();
        Self::kv(
            "Explained",
            &format!("{}/{}", explained, session.enrichments.len()),
        );
        if let Some(url) = session.digest.as_ref().and_then(|d| d.published_url.as_deref()) {
            Self::kv("Digest", url);
        }

        match session.final_state() {
            SessionState::Done if session.degraded => {
                Self::warning("Session finished with errors (see messages above)")
            }
            SessionState::Done => Self::success("Session finished"),
            SessionState::Failed(reason) => Self::error(&format!("Session failed: {}", reason)),
            other => Self::warning(&format!("Session stopped in state {:?}", other)),
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// First line of `content`, cut to `max_chars` with an ellipsis.
fn preview(content: &str, max_chars: usize) -> String {
    let line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= max_chars {
        line.to_string()
    } else {
        format!("{}...", line.chars().take(max_chars).collect::<String>())
    }
}
