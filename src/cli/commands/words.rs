//! Words command - inspect and edit the vocabulary list.

use crate::bot::split_words;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, WordsAction};
use crate::config::Settings;
use crate::vocabulary;
use anyhow::Result;

/// Run a words subcommand.
pub async fn run_words(action: &WordsAction, settings: Settings) -> Result<()> {
    preflight::check(Operation::Words, &settings)?;
    let source = vocabulary::from_settings(&settings)?;

    match action {
        WordsAction::List => {
            let spinner = Output::spinner("Fetching vocabulary...");
            let entries = source.list().await;
            spinner.finish_and_clear();
            let entries = entries?;

            if entries.is_empty() {
                Output::info("Your vocabulary list is empty.");
                Output::info("Add words with: wordcast words add <word>");
                return Ok(());
            }

            Output::header(&format!("Vocabulary ({} words)", entries.len()));
            println!();
            for entry in &entries {
                Output::word(&entry.word, &entry.explanation_snippet);
            }
        }

        WordsAction::Add { words } => {
            let words = normalize(words);
            let ack = source.add(&words).await?;
            Output::success(&ack);
        }

        WordsAction::Remove { words } => {
            let words = normalize(words);
            if source.remove(&words).await? {
                Output::success(&format!("Removed: {}", words.join(", ")));
            } else {
                Output::warning(&format!("Nothing removed for: {}", words.join(", ")));
            }
        }
    }

    Ok(())
}

/// Accept both `add snug lean` and `add "snug, lean"`.
fn normalize(args: &[String]) -> Vec<String> {
    args.iter().flat_map(|arg| split_words(arg)).collect()
}
