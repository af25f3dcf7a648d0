//! Token tree and tokenizer working buffer
//!
//! - **[`Token`]** / **[`TokenNode`]**: the output of tokenization. Flattening a
//!   sequence's leaf text reproduces the input exactly.
//! - **[`TokenStream`]**: the arena-backed linked list the tokenizer splices
//!   matches into. It is created per tokenize call and consumed once at the end.

pub mod token;
pub mod token_stream;

pub use token::{flatten, walk_tokens, Token, TokenContent, TokenNode};
pub use token_stream::{IntoValues, NodeId, TokenStream};
