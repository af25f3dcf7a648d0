//! Token tree types
//!
//! A tokenized document is a `Vec<TokenNode>`: untyped text leaves interleaved
//! with labelled [`Token`]s whose content is either literal text or a nested
//! sequence produced by an `inside` grammar.

use serde::Serialize;

/// A labelled span of the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub token_type: String,
    pub content: TokenContent,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,
    /// Characters of the original matched text
    pub length: usize,
}

/// Token content: literal text or a nested token sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenContent {
    Text(String),
    Nested(Vec<TokenNode>),
}

/// One element of a token sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenNode {
    Text(String),
    Token(Token),
}

impl Token {
    /// Build a token; `length` is taken from the matched text and never recomputed
    pub fn new(
        token_type: impl Into<String>,
        content: TokenContent,
        alias: Vec<String>,
        matched_text: &str,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            content,
            alias,
            length: matched_text.chars().count(),
        }
    }

    /// Token holding literal text
    pub fn text(token_type: impl Into<String>, text: &str) -> Self {
        Self::new(token_type, TokenContent::Text(text.to_string()), Vec::new(), text)
    }

    /// Flattened leaf text of this token
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.content.push_text(&mut out);
        out
    }

    /// Byte length of the flattened content
    pub fn span_len(&self) -> usize {
        self.content.byte_len()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias.iter().any(|a| a == alias)
    }

    /// Whether the token matches a type name or one of its aliases
    pub fn is(&self, name: &str) -> bool {
        self.token_type == name || self.has_alias(name)
    }

    pub fn nested(&self) -> Option<&[TokenNode]> {
        match &self.content {
            TokenContent::Nested(nodes) => Some(nodes),
            TokenContent::Text(_) => None,
        }
    }
}

impl TokenContent {
    fn push_text(&self, out: &mut String) {
        match self {
            TokenContent::Text(text) => out.push_str(text),
            TokenContent::Nested(nodes) => {
                for node in nodes {
                    node.push_text(out);
                }
            }
        }
    }

    fn byte_len(&self) -> usize {
        match self {
            TokenContent::Text(text) => text.len(),
            TokenContent::Nested(nodes) => nodes.iter().map(TokenNode::byte_len).sum(),
        }
    }
}

impl TokenNode {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            TokenNode::Token(token) => Some(token),
            TokenNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TokenNode::Text(text) => Some(text),
            TokenNode::Token(_) => None,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self, TokenNode::Token(_))
    }

    /// Byte length of the input this node covers
    pub fn byte_len(&self) -> usize {
        match self {
            TokenNode::Text(text) => text.len(),
            TokenNode::Token(token) => token.span_len(),
        }
    }

    fn push_text(&self, out: &mut String) {
        match self {
            TokenNode::Text(text) => out.push_str(text),
            TokenNode::Token(token) => token.content.push_text(out),
        }
    }
}

impl From<Token> for TokenNode {
    fn from(token: Token) -> Self {
        TokenNode::Token(token)
    }
}

impl From<&str> for TokenNode {
    fn from(text: &str) -> Self {
        TokenNode::Text(text.to_string())
    }
}

/// Concatenate the leaf text of a token sequence
pub fn flatten(nodes: &[TokenNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.push_text(&mut out);
    }
    out
}

/// Depth-first visit of every token in a sequence, nested ones included
pub fn walk_tokens<'a>(nodes: &'a [TokenNode], visit: &mut impl FnMut(&'a Token, usize)) {
    fn walk<'a>(nodes: &'a [TokenNode], depth: usize, visit: &mut impl FnMut(&'a Token, usize)) {
        for node in nodes {
            if let TokenNode::Token(token) = node {
                visit(token, depth);
                if let TokenContent::Nested(children) = &token.content {
                    walk(children, depth + 1, visit);
                }
            }
        }
    }
    walk(nodes, 0, visit);
}
