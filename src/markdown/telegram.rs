//! Rendering to Telegram's HTML message dialect.

use super::{parse, Block, Inline, Line};
use regex::Regex;
use std::sync::LazyLock;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("Invalid regex"));

/// Tags the renderer emits, all of which must be balanced.
const TAGS: &[&str] = &["b", "i", "s", "code", "pre", "a", "blockquote"];

/// Escape text for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Render Markdown as Telegram HTML.
pub fn to_telegram_html(markdown: &str) -> String {
    parse(markdown)
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Heading { content, .. } => format!("<b>{}</b>", render_inlines(content)),
        Block::Paragraph(lines) => render_lines(lines),
        Block::CodeBlock(code) => format!("<pre>{}</pre>", escape_html(code)),
        Block::Quote(lines) => format!("<blockquote>{}</blockquote>", render_lines(lines)),
        Block::List { ordered, items } => items
            .iter()
            .enumerate()
            .map(|(n, item)| {
                let marker = if *ordered { format!("{}.", n + 1) } else { "•".to_string() };
                format!("{} {}", marker, render_lines(item))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Rule => "──────────".to_string(),
    }
}

fn render_lines(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| render_inlines(l))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_inlines(inlines: &[Inline]) -> String {
    inlines.iter().map(render_inline).collect()
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text(t) => escape_html(t),
        Inline::Strong(c) => format!("<b>{}</b>", render_inlines(c)),
        Inline::Emphasis(c) => format!("<i>{}</i>", render_inlines(c)),
        Inline::Strike(c) => format!("<s>{}</s>", render_inlines(c)),
        Inline::Code(t) => format!("<code>{}</code>", escape_html(t)),
        Inline::Link { text, url } => {
            format!("<a href=\"{}\">{}</a>", escape_attr(url), render_inlines(text))
        }
        Inline::Break => "\n".to_string(),
    }
}

/// Collapse blank lines into single line breaks.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text.trim(), "\n").into_owned()
}

/// Truncate rendered HTML to at most `max_chars` characters.
///
/// The cut never splits a tag or an entity, and every tag left open at the cut
/// is closed so the result still parses.
pub fn truncate_html(html: &str, max_chars: usize) -> String {
    if html.chars().count() <= max_chars {
        return html.to_string();
    }

    let mut out = String::new();
    let mut open: Vec<&'static str> = Vec::new();
    let mut used = 0;
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        // Unit is a whole tag, a whole entity, or a single character
        let unit_len = match c {
            '<' => rest.find('>').map_or(rest.len(), |end| end + 1),
            '&' => rest
                .find(';')
                .filter(|&end| end <= 8)
                .map_or(c.len_utf8(), |end| end + 1),
            _ => c.len_utf8(),
        };
        let unit = &rest[..unit_len];

        let closing_cost: usize = open.iter().map(|t| t.len() + 3).sum();
        let tag = (c == '<').then(|| tag_name(unit)).flatten();

        let extra_closing = match tag {
            Some((name, false)) => name.len() + 3,
            _ => 0,
        };
        if used + unit.chars().count() + closing_cost + extra_closing > max_chars {
            break;
        }

        match tag {
            Some((name, false)) => open.push(name),
            Some((name, true)) => {
                if let Some(pos) = open.iter().rposition(|t| *t == name) {
                    open.remove(pos);
                }
            }
            None => {}
        }

        out.push_str(unit);
        used += unit.chars().count();
        rest = &rest[unit_len..];
    }

    for name in open.iter().rev() {
        out.push_str(&format!("</{}>", name));
    }
    out
}

/// Recognize one of the emitted tags, returning its name and whether it closes.
fn tag_name(tag: &str) -> Option<(&'static str, bool)> {
    let inner = tag.strip_prefix('<')?.strip_suffix('>')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name = inner.split(|c: char| c.is_whitespace()).next()?;
    TAGS.iter().find(|t| **t == name).map(|t| (*t, closing))
}
