//! Rendering to Telegraph's node-array content format.

use super::{parse, Block, Inline, Line};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Telegraph content node: either text or an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element(NodeElement),
}

/// A DOM element as Telegraph represents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl NodeElement {
    fn new(tag: &str, children: Vec<Node>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: None,
            children: (!children.is_empty()).then_some(children),
        }
    }
}

fn element(tag: &str, children: Vec<Node>) -> Node {
    Node::Element(NodeElement::new(tag, children))
}

/// Convert Markdown into Telegraph nodes.
pub fn to_nodes(markdown: &str) -> Vec<Node> {
    parse(markdown).iter().map(block_node).collect()
}

/// Serialized size of the content, which Telegraph caps at 64 KB.
pub fn content_size(nodes: &[Node]) -> usize {
    serde_json::to_string(nodes).map(|s| s.len()).unwrap_or(0)
}

fn block_node(block: &Block) -> Node {
    match block {
        // Telegraph only supports h3 and h4
        Block::Heading { level, content } => {
            let tag = if *level <= 2 { "h3" } else { "h4" };
            element(tag, inline_nodes(content))
        }
        Block::Paragraph(lines) => element("p", lines_nodes(lines)),
        Block::CodeBlock(code) => element("pre", vec![Node::Text(code.clone())]),
        Block::Quote(lines) => element("blockquote", lines_nodes(lines)),
        Block::List { ordered, items } => element(
            if *ordered { "ol" } else { "ul" },
            items
                .iter()
                .map(|item| element("li", lines_nodes(item)))
                .collect(),
        ),
        Block::Rule => element("hr", Vec::new()),
    }
}

fn lines_nodes(lines: &[Line]) -> Vec<Node> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(element("br", Vec::new()));
        }
        out.extend(inline_nodes(line));
    }
    out
}

fn inline_nodes(inlines: &[Inline]) -> Vec<Node> {
    inlines.iter().map(inline_node).collect()
}

fn inline_node(inline: &Inline) -> Node {
    match inline {
        Inline::Text(t) => Node::Text(t.clone()),
        Inline::Strong(c) => element("strong", inline_nodes(c)),
        Inline::Emphasis(c) => element("em", inline_nodes(c)),
        Inline::Strike(c) => element("s", inline_nodes(c)),
        Inline::Code(t) => element("code", vec![Node::Text(t.clone())]),
        Inline::Link { text, url } => Node::Element(NodeElement {
            tag: "a".to_string(),
            attrs: Some(HashMap::from([("href".to_string(), url.clone())])),
            children: Some(inline_nodes(text)),
        }),
        Inline::Break => element("br", Vec::new()),
    }
}
