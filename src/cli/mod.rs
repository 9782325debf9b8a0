//! CLI module for Wordcast.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Wordcast - vocabulary review digests over Telegram
///
/// Picks words from your study list on a daily schedule, explains each one,
/// writes a short essay using them all and reads it aloud.
#[derive(Parser, Debug)]
#[command(name = "wordcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Telegram bot with its daily scheduler
    Bot,

    /// Run one review session now
    Session {
        /// Telegram chat to deliver to (group chats are negative)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        chat: i64,

        /// Print messages to the terminal instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the vocabulary list
    Words {
        #[command(subcommand)]
        action: WordsAction,
    },

    /// Show reference links and an explanation for a word
    Define {
        /// The word or phrase
        word: String,
    },

    /// Check configuration and credentials
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum WordsAction {
    /// List all words
    List,

    /// Add words (comma separated or one per argument)
    Add {
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Remove words
    Remove {
        #[arg(required = true)]
        words: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
