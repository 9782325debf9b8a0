//! Prompt templates for Wordcast.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// Per-word explanation prompts.
    pub explanation: ExplanationPrompts,
    /// Digest essay prompts.
    pub writer: WriterPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for explaining a single word (or a short list of words).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplanationPrompts {
    pub system: String,
    /// User message for one word; `{{word}}` and `{{dictionary}}` are substituted.
    pub user: String,
    /// User message for a batch of newly added words; `{{words}}` is substituted.
    pub batch: String,
}

impl Default for ExplanationPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a professional English teacher.
Given an English word (optionally with a dictionary entry for reference), explain it for a Chinese-speaking learner.

For each word output, in Markdown:
1. The word in bold.
2. *📢 IPA*: American IPA for every part of speech, e.g. `- n: /ˈdez.ɚt/`.
3. *📔 Definition*: definitions in English (🇬🇧) and Chinese (🇨🇳), grouped by part of speech.
4. *🟢 Tenses and voices*: all inflected forms.
5. *🪐 Synonyms* and *🌗 Antonyms*, grouped by part of speech.
6. *📚 Collocation*: common collocations with Chinese glosses.
7. *💬 Sentence*: two or more example sentences, each followed by its Chinese translation.

Rules:
- Don't omit any word you are given.
- Prefer the supplied dictionary entry when it disagrees with your own knowledge.
- Output only the explanation, no preamble."#
                .to_string(),

            user: r#"word: "{{word}}", original explanation:
```
{{dictionary}}
```"#
                .to_string(),

            batch: r#"explain all these words: "{{words}}""#.to_string(),
        }
    }
}

/// Prompts for the digest essay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterPrompts {
    pub system: String,
    /// User message; `{{words}}` is substituted with one word per line.
    pub user: String,
    /// Follow-up when words were left out; `{{words}}` and `{{missing}}` are substituted.
    pub retry: String,
}

impl Default for WriterPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an IELTS writing examiner who also writes model essays.
Write a short essay (no more than 280 words) that uses EVERY word in the given list at least once.

The essay is graded on:
- Task achievement: a clear position on a single topic, fully developed.
- Coherence and cohesion: logical paragraphs with natural linking.
- Lexical resource: the target words are used accurately and naturally, alongside varied vocabulary.
- Grammatical range and accuracy: a mix of simple and complex sentences without errors.

Format:
- Markdown, starting with a `#` title.
- Every target word is wrapped in **bold** wherever it appears.
- No commentary before or after the essay."#
                .to_string(),

            user: r#"words:
{{words}}"#
                .to_string(),

            retry: r#"Rewrite the essay so that it uses every one of these words:
{{words}}

The previous draft left out: {{missing}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let explanation_path = custom_path.join("explanation.toml");
            if explanation_path.exists() {
                let content = std::fs::read_to_string(&explanation_path)?;
                prompts.explanation = toml::from_str(&content)?;
            }

            let writer_path = custom_path.join("writer.toml");
            if writer_path.exists() {
                let content = std::fs::read_to_string(&writer_path)?;
                prompts.writer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// System instruction for word explanations.
    pub fn explanation_system(&self) -> String {
        self.render_with_custom(&self.explanation.system, &HashMap::new())
    }

    /// System instruction for the digest essay.
    pub fn writer_system(&self) -> String {
        self.render_with_custom(&self.writer.system, &HashMap::new())
    }

    /// User message asking for one word's explanation.
    pub fn explanation_user(&self, word: &str, dictionary_text: &str) -> String {
        let vars = HashMap::from([
            ("word".to_string(), word.to_string()),
            ("dictionary".to_string(), dictionary_text.to_string()),
        ]);
        self.render_with_custom(&self.explanation.user, &vars)
    }

    /// User message asking for an explanation of several words at once.
    pub fn explanation_batch(&self, words: &[String]) -> String {
        let vars = HashMap::from([("words".to_string(), words.join(", "))]);
        self.render_with_custom(&self.explanation.batch, &vars)
    }

    /// User message asking for the digest essay.
    pub fn writer_user(&self, words: &[String]) -> String {
        let vars = HashMap::from([("words".to_string(), words.join("\n"))]);
        self.render_with_custom(&self.writer.user, &vars)
    }

    /// Follow-up message naming the words a draft left out.
    pub fn writer_retry(&self, words: &[String], missing: &[String]) -> String {
        let vars = HashMap::from([
            ("words".to_string(), words.join("\n")),
            ("missing".to_string(), missing.join(", ")),
        ]);
        self.render_with_custom(&self.writer.retry, &vars)
    }
}
