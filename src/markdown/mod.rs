//! Markdown handling for LLM output.
//!
//! LLM answers arrive as loosely formatted Markdown. This module parses the
//! subset that shows up in practice into a small block/inline tree and renders
//! it three ways:
//!
//! - [`to_telegram_html`]: Telegram `parse_mode=HTML` messages.
//! - [`to_nodes`]: Telegraph page content.
//! - [`to_plain_text`]: narratable text for speech synthesis.
//!
//! [`normalize`] is the sanitizing pass applied before a second publish attempt.

mod plain;
mod telegram;
mod telegraph;

pub use plain::to_plain_text;
pub use telegram::{collapse_blank_lines, escape_html, to_telegram_html, truncate_html};
pub use telegraph::{content_size, to_nodes, Node, NodeElement};

use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("Invalid regex"));
static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([-*_])(\s*[-*_]){2,}\s*$").expect("Invalid regex"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").expect("Invalid regex"));
static ORDERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,9}[.)]\s+(.*)$").expect("Invalid regex"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>|<!--.*?-->").expect("Invalid regex"));
static LINE_BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid regex"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("Invalid regex"));
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|?\s*:?-{2,}:?\s*(\|\s*:?-{2,}:?\s*)*\|?\s*$").expect("Invalid regex"));
static EXTRA_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid regex"));

/// One visual line of inline content.
pub type Line = Vec<Inline>;

/// Block-level element.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, content: Line },
    /// Consecutive lines; line breaks inside a paragraph are kept.
    Paragraph(Vec<Line>),
    CodeBlock(String),
    Quote(Vec<Line>),
    List { ordered: bool, items: Vec<Vec<Line>> },
    Rule,
}

/// Inline element.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Strike(Vec<Inline>),
    Code(String),
    Link { text: Vec<Inline>, url: String },
    Break,
}

impl Inline {
    /// Text content without any markup.
    pub fn plain(&self) -> String {
        match self {
            Inline::Text(t) | Inline::Code(t) => t.clone(),
            Inline::Strong(c) | Inline::Emphasis(c) | Inline::Strike(c) => plain_of(c),
            Inline::Link { text, .. } => plain_of(text),
            Inline::Break => "\n".to_string(),
        }
    }
}

/// Concatenate the plain text of a run of inlines.
pub fn plain_of(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain).collect()
}

/// Parse Markdown into blocks.
pub fn parse(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<Line> = Vec::new();
    let mut quote: Vec<Line> = Vec::new();
    let mut list: Option<(bool, Vec<Vec<Line>>)> = None;

    fn flush(
        blocks: &mut Vec<Block>,
        paragraph: &mut Vec<Line>,
        quote: &mut Vec<Line>,
        list: &mut Option<(bool, Vec<Vec<Line>>)>,
    ) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
        if !quote.is_empty() {
            blocks.push(Block::Quote(std::mem::take(quote)));
        }
        if let Some((ordered, items)) = list.take() {
            blocks.push(Block::List { ordered, items });
        }
    }

    let mut lines = markdown.lines();
    while let Some(raw) = lines.next() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            let fence = &trimmed[..3];
            let mut code = Vec::new();
            for code_line in lines.by_ref() {
                if code_line.trim_start().starts_with(fence) {
                    break;
                }
                code.push(code_line);
            }
            blocks.push(Block::CodeBlock(code.join("\n")));
            continue;
        }

        if trimmed.is_empty() {
            flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            continue;
        }

        if let Some(caps) = HEADING.captures(trimmed) {
            flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                content: parse_inline(&caps[2]),
            });
            continue;
        }

        if RULE.is_match(trimmed) {
            flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            blocks.push(Block::Rule);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            if quote.is_empty() {
                flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            }
            quote.push(parse_inline(rest.trim_start()));
            continue;
        }

        let item = BULLET
            .captures(line)
            .map(|c| (false, c[1].to_string()))
            .or_else(|| ORDERED.captures(line).map(|c| (true, c[1].to_string())));

        if let Some((ordered, content)) = item {
            if !paragraph.is_empty() || !quote.is_empty() {
                flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
            }
            let same_kind = matches!(&list, Some((kind, _)) if *kind == ordered);
            if !same_kind {
                flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
                list = Some((ordered, Vec::new()));
            }
            if let Some((_, items)) = &mut list {
                items.push(vec![parse_inline(&content)]);
            }
            continue;
        }

        // Continuation of the current list item, quote or paragraph
        if let Some((_, items)) = &mut list {
            if let Some(last) = items.last_mut() {
                last.push(parse_inline(trimmed));
                continue;
            }
        }
        if !quote.is_empty() {
            flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
        }
        paragraph.push(parse_inline(trimmed));
    }

    flush(&mut blocks, &mut paragraph, &mut quote, &mut list);
    blocks
}

/// Parse inline Markdown (emphasis, code, links, `<br>`).
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    let flush = |buf: &mut String, out: &mut Vec<Inline>| {
        if !buf.is_empty() {
            out.push(Inline::Text(std::mem::take(buf)));
        }
    };

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && chars.get(i + 1).is_some_and(|n| n.is_ascii_punctuation()) {
            buf.push(chars[i + 1]);
            i += 2;
            continue;
        }

        if c == '`' {
            if let Some(end) = find_from(&chars, i + 1, |ch| ch == '`') {
                flush(&mut buf, &mut out);
                out.push(Inline::Code(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }

        if matches!(c, '*' | '_' | '~') && chars.get(i + 1) == Some(&c) {
            if let Some(end) = find_pair(&chars, i + 2, c) {
                if end > i + 2 {
                    flush(&mut buf, &mut out);
                    let inner = parse_inline(&chars[i + 2..end].iter().collect::<String>());
                    out.push(if c == '~' { Inline::Strike(inner) } else { Inline::Strong(inner) });
                    i = end + 2;
                    continue;
                }
            }
        }

        if (c == '*' || c == '_') && opens_emphasis(&chars, i) {
            if let Some(end) = find_closing_emphasis(&chars, i + 1, c) {
                flush(&mut buf, &mut out);
                let inner = parse_inline(&chars[i + 1..end].iter().collect::<String>());
                out.push(Inline::Emphasis(inner));
                i = end + 1;
                continue;
            }
        }

        let link_start = if c == '!' && chars.get(i + 1) == Some(&'[') { i + 1 } else { i };
        if chars.get(link_start) == Some(&'[') {
            if let Some((label, url, next)) = parse_link(&chars, link_start) {
                flush(&mut buf, &mut out);
                out.push(Inline::Link { text: parse_inline(&label), url });
                i = next;
                continue;
            }
        }

        if c == '<' {
            let rest: String = chars[i..chars.len().min(i + 6)].iter().collect();
            if let Some(m) = LINE_BREAK_TAG.find(&rest).filter(|m| m.start() == 0) {
                flush(&mut buf, &mut out);
                out.push(Inline::Break);
                i += rest[..m.end()].chars().count();
                continue;
            }
        }

        buf.push(c);
        i += 1;
    }

    flush(&mut buf, &mut out);
    out
}

fn find_from(chars: &[char], from: usize, pred: impl Fn(char) -> bool) -> Option<usize> {
    (from..chars.len()).find(|&j| pred(chars[j]))
}

fn find_pair(chars: &[char], from: usize, c: char) -> Option<usize> {
    (from..chars.len().saturating_sub(1)).find(|&j| chars[j] == c && chars[j + 1] == c)
}

fn opens_emphasis(chars: &[char], i: usize) -> bool {
    let next_ok = chars.get(i + 1).is_some_and(|n| !n.is_whitespace());
    // Intraword underscores (snake_case) are literal
    let prev_ok = chars[i] == '*' || i == 0 || !chars[i - 1].is_alphanumeric();
    next_ok && prev_ok
}

fn find_closing_emphasis(chars: &[char], from: usize, c: char) -> Option<usize> {
    (from + 1..chars.len()).find(|&j| {
        chars[j] == c
            && !chars[j - 1].is_whitespace()
            && (c == '*' || chars.get(j + 1).map_or(true, |n| !n.is_alphanumeric()))
    })
}

fn parse_link(chars: &[char], open: usize) -> Option<(String, String, usize)> {
    let close = find_from(chars, open + 1, |ch| ch == ']')?;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = find_from(chars, close + 2, |ch| ch == ')')?;
    let label: String = chars[open + 1..close].iter().collect();
    let url: String = chars[close + 2..end].iter().collect::<String>().trim().to_string();
    if url.is_empty() {
        return None;
    }
    Some((label, url, end + 1))
}

/// Remove raw HTML, turning `<br>` into newlines.
pub fn strip_html(text: &str) -> String {
    let with_breaks = LINE_BREAK_TAG.replace_all(text, "\n");
    HTML_TAG.replace_all(&with_breaks, "").into_owned()
}

/// Sanitize Markdown that a publishing service rejected.
///
/// Drops raw HTML and images, flattens tables into plain rows, removes
/// backslash escapes and collapses runs of blank lines.
pub fn normalize(markdown: &str) -> String {
    let without_html = strip_html(markdown);
    let without_images = IMAGE.replace_all(&without_html, "$1");

    let lines: Vec<String> = without_images
        .lines()
        .filter(|line| !TABLE_SEPARATOR.is_match(line))
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.len() > 1 {
                trimmed
                    .trim_matches('|')
                    .split('|')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(" · ")
            } else {
                line.replace('\\', "")
            }
        })
        .collect();

    EXTRA_BLANKS
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_inline_emphasis() {
        assert_eq!(
            parse_inline("a **bold** and *it* and ~~gone~~"),
            vec![
                text("a "),
                Inline::Strong(vec![text("bold")]),
                text(" and "),
                Inline::Emphasis(vec![text("it")]),
                text(" and "),
                Inline::Strike(vec![text("gone")]),
            ]
        );
    }

    #[test]
    fn test_inline_literals() {
        assert_eq!(parse_inline("snake_case_name"), vec![text("snake_case_name")]);
        assert_eq!(parse_inline("2 * 3 * 4"), vec![text("2 * 3 * 4")]);
        assert_eq!(parse_inline(r"\*not\*"), vec![text("*not*")]);
        assert_eq!(parse_inline("[dangling"), vec![text("[dangling")]);
    }

    #[test]
    fn test_inline_code_and_links() {
        assert_eq!(
            parse_inline("use `x*y` at [site](https://a.b/c?d=1)"),
            vec![
                text("use "),
                Inline::Code("x*y".to_string()),
                text(" at "),
                Inline::Link {
                    text: vec![text("site")],
                    url: "https://a.b/c?d=1".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_inline_break() {
        assert_eq!(
            parse_inline("one<br>two<BR/>"),
            vec![text("one"), Inline::Break, text("two"), Inline::Break]
        );
    }

    #[test]
    fn test_parse_blocks() {
        let md = "# Title\n\nFirst line\nsecond line\n\n- a\n- b\n  more b\n\n1. one\n2. two\n\n> quoted\n\n---\n\n```\ncode *here*\n```";
        let blocks = parse(md);

        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[0], Block::Heading { level: 1, content: vec![text("Title")] });
        assert_eq!(
            blocks[1],
            Block::Paragraph(vec![vec![text("First line")], vec![text("second line")]])
        );
        match &blocks[2] {
            Block::List { ordered: false, items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1], vec![vec![text("b")], vec![text("more b")]]);
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert!(matches!(&blocks[3], Block::List { ordered: true, items } if items.len() == 2));
        assert_eq!(blocks[4], Block::Quote(vec![vec![text("quoted")]]));
        assert_eq!(blocks[5], Block::Rule);
        assert_eq!(blocks[6], Block::CodeBlock("code *here*".to_string()));
    }

    #[test]
    fn test_unterminated_fence_takes_rest() {
        let blocks = parse("intro\n```\nlet x = 1;");
        assert_eq!(blocks[1], Block::CodeBlock("let x = 1;".to_string()));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("a<br>b <span class=\"x\">c</span>"), "a\nb c");
    }

    #[test]
    fn test_normalize() {
        let md = "Intro <b>bold</b>\n\n\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n![pic](http://x/y.png) \\*done\\*";
        assert_eq!(normalize(md), "Intro bold\n\na · b\n1 · 2\n\npic *done*");
    }
}
