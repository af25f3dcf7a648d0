//! Arena-backed doubly linked token stream
//!
//! The tokenizer's working buffer. Nodes live in a `Vec` and are addressed by
//! [`NodeId`]; splicing is O(1) and ids stay valid across edits. Two sentinel
//! nodes bound the live list.

use super::token::TokenNode;

/// Handle to a node in a [`TokenStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    /// `None` for sentinels and removed nodes
    value: Option<TokenNode>,
    /// Bytes of input the value covers
    width: usize,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
pub struct TokenStream {
    nodes: Vec<Node>,
    head: NodeId,
    tail: NodeId,
    len: usize,
}

impl TokenStream {
    pub fn new() -> Self {
        let head = NodeId(0);
        let tail = NodeId(1);
        Self {
            nodes: vec![
                Node {
                    value: None,
                    width: 0,
                    prev: None,
                    next: Some(tail),
                },
                Node {
                    value: None,
                    width: 0,
                    prev: Some(head),
                    next: None,
                },
            ],
            head,
            tail,
            len: 0,
        }
    }

    /// Stream holding a single text leaf
    pub fn from_text(text: &str) -> Self {
        let mut stream = Self::new();
        let head = stream.head;
        stream.insert_after(head, TokenNode::Text(text.to_string()));
        stream
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn tail(&self) -> NodeId {
        self.tail
    }

    /// Live nodes between the sentinels
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev
    }

    pub fn value(&self, id: NodeId) -> Option<&TokenNode> {
        self.nodes[id.0].value.as_ref()
    }

    /// Bytes of input covered by the node; zero for sentinels
    pub fn width(&self, id: NodeId) -> usize {
        self.nodes[id.0].width
    }

    /// Text of a leaf node, `None` for tokens and sentinels
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.value(id) {
            Some(TokenNode::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn is_token(&self, id: NodeId) -> bool {
        matches!(self.value(id), Some(TokenNode::Token(_)))
    }

    /// Link a new node right after `node` and return its id
    pub fn insert_after(&mut self, node: NodeId, value: TokenNode) -> NodeId {
        let next = self.nodes[node.0].next.unwrap_or(self.tail);
        let id = NodeId(self.nodes.len());
        let width = value.byte_len();

        self.nodes.push(Node {
            value: Some(value),
            width,
            prev: Some(node),
            next: Some(next),
        });
        self.nodes[node.0].next = Some(id);
        self.nodes[next.0].prev = Some(id);
        self.len += 1;

        id
    }

    /// Unlink up to `count` live nodes following `node`, stopping at the tail.
    /// Returns how many were removed.
    pub fn remove_range(&mut self, node: NodeId, count: usize) -> usize {
        let mut next = self.nodes[node.0].next.unwrap_or(self.tail);
        let mut removed = 0;

        while removed < count && next != self.tail {
            let after = self.nodes[next.0].next.unwrap_or(self.tail);
            let detached = &mut self.nodes[next.0];
            detached.value = None;
            detached.prev = None;
            detached.next = None;
            next = after;
            removed += 1;
        }

        self.nodes[node.0].next = Some(next);
        self.nodes[next.0].prev = Some(node);
        self.len -= removed;

        removed
    }

    /// Consume the stream, yielding live values head to tail
    pub fn into_values(self) -> IntoValues {
        let cursor = self.nodes[self.head.0].next;
        IntoValues {
            nodes: self.nodes,
            cursor,
            tail: self.tail,
        }
    }
}

impl Default for TokenStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pass iterator over the live values of a consumed stream
pub struct IntoValues {
    nodes: Vec<Node>,
    cursor: Option<NodeId>,
    tail: NodeId,
}

impl Iterator for IntoValues {
    type Item = TokenNode;

    fn next(&mut self) -> Option<TokenNode> {
        loop {
            let id = self.cursor.filter(|id| *id != self.tail)?;
            let node = &mut self.nodes[id.0];
            self.cursor = node.next;
            if let Some(value) = node.value.take() {
                return Some(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;

    fn texts(stream: TokenStream) -> Vec<String> {
        stream
            .into_values()
            .map(|node| match node {
                TokenNode::Text(text) => text,
                TokenNode::Token(token) => format!("<{}>", token.token_type),
            })
            .collect()
    }

    #[test]
    fn test_from_text() {
        let stream = TokenStream::from_text("abc");
        assert_eq!(stream.len(), 1);

        let first = stream.next(stream.head()).unwrap();
        assert_eq!(stream.text(first), Some("abc"));
        assert_eq!(stream.width(first), 3);
        assert_eq!(stream.next(first), Some(stream.tail()));
        assert_eq!(stream.prev(first), Some(stream.head()));
    }

    #[test]
    fn test_insert_after_splices() {
        let mut stream = TokenStream::from_text("a");
        let a = stream.next(stream.head()).unwrap();
        let c = stream.insert_after(a, TokenNode::from("c"));
        stream.insert_after(a, TokenNode::from("b"));

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.text(c), Some("c"));
        assert_eq!(texts(stream), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_range_stops_at_tail() {
        let mut stream = TokenStream::from_text("a");
        let a = stream.next(stream.head()).unwrap();
        let b = stream.insert_after(a, TokenNode::from("b"));
        stream.insert_after(b, TokenNode::from("c"));

        let removed = stream.remove_range(a, 5);
        assert_eq!(removed, 2);
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.next(a), Some(stream.tail()));
        assert_eq!(stream.prev(stream.tail()), Some(a));
        assert!(stream.value(b).is_none());
    }

    #[test]
    fn test_replace_with_token() {
        let mut stream = TokenStream::from_text("12");
        let head = stream.head();
        stream.remove_range(head, 1);
        let token = stream.insert_after(head, TokenNode::from(Token::text("num", "12")));

        assert!(stream.is_token(token));
        assert_eq!(stream.width(token), 2);
        assert_eq!(texts(stream), vec!["<num>"]);
    }

    #[test]
    fn test_empty_stream() {
        let stream = TokenStream::new();
        assert!(stream.is_empty());
        assert_eq!(stream.into_values().count(), 0);
    }
}
