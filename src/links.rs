//! Reference links for a word.
//!
//! Builds a Markdown block of dictionary, pronunciation and thesaurus lookups.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is when encoding a word (RFC 3986 unreserved set).
const WORD: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const BING_CLIENT_VERSION: &str = "BDDTV3.5.1.4320";

/// Percent-encode a word for use in a URL path or query value.
pub fn encode(word: &str) -> String {
    utf8_percent_encode(word, WORD).to_string()
}

/// Pronunciation audio URL (`american = false` gives British English).
pub fn pronunciation_url(word: &str, american: bool) -> String {
    format!(
        "https://dict.youdao.com/dictvoice?audio={}&type={}",
        encode(word),
        if american { 2 } else { 1 }
    )
}

/// Build the reference-links block for a word.
pub fn compose_links(word: &str) -> String {
    let w = encode(word);
    let links = [
        ("🇺🇸 MAmE".to_string(), pronunciation_url(word, true)),
        ("🇬🇧 BrE".to_string(), pronunciation_url(word, false)),
        ("EUDIC".to_string(), format!("https://dict.eudic.net/dicts/en/{w}")),
        ("You Dao".to_string(), format!("https://dict.youdao.com/m/result?word={w}&lang=en")),
        ("Thesaurus".to_string(), format!("https://www.thesaurus.com/browse/{w}")),
        ("Google".to_string(), format!("https://www.google.com/search?q=define:{w}")),
        ("Merriam Webster".to_string(), format!("https://www.merriam-webster.com/dictionary/{w}")),
        ("Vocabulary".to_string(), format!("https://www.vocabulary.com/dictionary/{w}")),
        (
            "Oxford Learner's Dictionary".to_string(),
            format!(
                "https://www.oxfordlearnersdictionaries.com/definition/english/{}",
                encode(&word.to_lowercase())
            ),
        ),
        (
            "Bing Dict".to_string(),
            format!(
                "https://cn.bing.com/dict/clientsearch?mkt=zh-CN&setLang=zh&form=BDVEHC&ClientVer={}&q={w}",
                encode(BING_CLIENT_VERSION)
            ),
        ),
        ("URBAN DICTIONARY".to_string(), format!("https://www.urbandictionary.com/define.php?term={w}")),
        ("Cambridge".to_string(), format!("https://dictionary.cambridge.org/dictionary/english/{w}")),
    ];

    links
        .iter()
        .map(|(label, url)| format!("[{label}]({url})"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("snug"), "snug");
        assert_eq!(encode("cost basis"), "cost%20basis");
        assert_eq!(encode("deep-pocketed"), "deep-pocketed");
        assert_eq!(encode("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode("café"), "caf%C3%A9");
    }

    #[test]
    fn test_links_encode_every_reference() {
        let block = compose_links("cost basis");
        assert!(!block.contains("cost basis)"));
        assert_eq!(block.matches("cost%20basis").count(), 12);
        assert!(block.contains("[Cambridge](https://dictionary.cambridge.org/dictionary/english/cost%20basis)"));
    }

    #[test]
    fn test_links_are_deterministic() {
        assert_eq!(compose_links("Lean"), compose_links("Lean"));
        assert!(compose_links("Lean").contains("definition/english/lean)"));
        assert!(compose_links("Lean").contains("ClientVer=BDDTV3.5.1.4320&q=Lean"));
    }

    #[test]
    fn test_pronunciation_url() {
        assert_eq!(
            pronunciation_url("flounce", true),
            "https://dict.youdao.com/dictvoice?audio=flounce&type=2"
        );
        assert!(pronunciation_url("flounce", false).ends_with("type=1"));
    }
}
