//! Markup escaping of token trees

use crate::tokens::{TokenContent, TokenNode};

/// Escape `&` and `<`, and turn no-break spaces into plain spaces
pub fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '\u{a0}' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Escape every text leaf of a token tree. Token types, aliases and lengths
/// are left as they were.
pub fn encode(nodes: Vec<TokenNode>) -> Vec<TokenNode> {
    nodes.into_iter().map(encode_node).collect()
}

fn encode_node(node: TokenNode) -> TokenNode {
    match node {
        TokenNode::Text(text) => TokenNode::Text(encode_text(&text)),
        TokenNode::Token(mut token) => {
            token.content = match token.content {
                TokenContent::Text(text) => TokenContent::Text(encode_text(&text)),
                TokenContent::Nested(children) => TokenContent::Nested(encode(children)),
            };
            TokenNode::Token(token)
        }
    }
}
