//! Local dictionary lookup.
//!
//! Reads a tab-separated export (`word<TAB>definition`), where definitions
//! may contain HTML and literal `\n` escapes.

use crate::error::{Result, WordcastError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Wrap width for HTML definitions rendered to text.
const TEXT_WIDTH: usize = 80;

/// Trait for a fast, local, non-failing word lookup.
pub trait LocalDictionary: Send + Sync {
    /// Definition text for `word`, or an empty string on a miss.
    fn lookup(&self, word: &str) -> String;
}

/// Dictionary that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDictionary;

impl LocalDictionary for NoDictionary {
    fn lookup(&self, _word: &str) -> String {
        String::new()
    }
}

/// Dictionary loaded into memory from a TSV file.
#[derive(Debug, Default)]
pub struct FileDictionary {
    entries: HashMap<String, String>,
}

impl FileDictionary {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WordcastError::Dictionary(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let dictionary = Self::parse(&content);
        info!(path = %path.display(), entries = dictionary.len(), "Loaded dictionary");
        Ok(dictionary)
    }

    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            let Some((word, definition)) = line.split_once('\t') else {
                continue;
            };
            let word = word.trim();
            if word.is_empty() {
                continue;
            }
            entries
                .entry(word.to_lowercase())
                .or_insert_with(|| definition.to_string());
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalDictionary for FileDictionary {
    fn lookup(&self, word: &str) -> String {
        self.entries
            .get(&word.trim().to_lowercase())
            .map(|raw| render_definition(raw))
            .unwrap_or_default()
    }
}

fn render_definition(raw: &str) -> String {
    let unescaped = raw.replace("\\n", "\n");
    if !unescaped.contains('<') {
        return unescaped.trim().to_string();
    }
    match html2text::from_read(unescaped.as_bytes(), TEXT_WIDTH) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "Could not render definition HTML");
            crate::markdown::strip_html(&unescaped).trim().to_string()
        }
    }
}

/// Open the configured dictionary, or an empty one when none is configured.
pub fn open(path: Option<&Path>) -> Result<Arc<dyn LocalDictionary>> {
    match path {
        Some(path) => Ok(Arc::new(FileDictionary::load(path)?)),
        None => Ok(Arc::new(NoDictionary)),
    }
}
