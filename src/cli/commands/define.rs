//! Define command - links, dictionary entry and explanation for one word.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::dictionary;
use crate::links::compose_links;
use crate::llm::{ChatModel, OpenAIChat};
use anyhow::Result;
use console::style;

/// Print everything the bot would send for `/define <word>`.
pub async fn run_define(word: &str, settings: Settings) -> Result<()> {
    preflight::check(Operation::Define, &settings)?;

    let word = word.trim();
    if word.is_empty() {
        anyhow::bail!("word must not be empty");
    }

    let dictionary = dictionary::open(settings.dictionary_path().as_deref())?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let llm = OpenAIChat::from_settings(&settings.llm)?;

    Output::header(word);
    println!();
    println!("{}", compose_links(word));

    let dictionary_text = dictionary.lookup(word);
    if !dictionary_text.is_empty() {
        println!();
        println!("{}", style("Dictionary").bold());
        println!("{}", dictionary_text);
    }

    let spinner = Output::spinner(&format!("Asking {}...", llm.model()));
    let explanation = llm
        .complete(
            &prompts.explanation_system(),
            &prompts.explanation_user(word, &dictionary_text),
        )
        .await;
    spinner.finish_and_clear();

    println!();
    println!("{}", explanation?);
    Ok(())
}
