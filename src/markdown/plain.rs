//! Plain-text rendering for narration.

use super::{parse, plain_of, strip_html, Block, Line};

/// Reduce Markdown to text suitable for speech synthesis.
///
/// Markup, link targets and code blocks are dropped; list items and headings
/// each get their own line.
pub fn to_plain_text(markdown: &str) -> String {
    parse(&strip_html(markdown))
        .iter()
        .filter_map(|block| match block {
            Block::Heading { content, .. } => Some(plain_of(content)),
            Block::Paragraph(lines) | Block::Quote(lines) => Some(join_lines(lines)),
            Block::List { items, .. } => Some(
                items
                    .iter()
                    .map(|item| join_lines(item))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Block::CodeBlock(_) | Block::Rule => None,
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn join_lines(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| plain_of(l))
        .collect::<Vec<_>>()
        .join("\n")
}
