// Internal modules
pub mod config;
pub mod grammar;
pub mod hooks;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod tokens;

// Re-export key types for library consumers
pub use grammar::{Grammar, GrammarError, GrammarId, GrammarRegistry, Rule};
pub use hooks::{HookBus, HookError};
pub use lexical::{tokenize, LexerError, TokenizeMetrics, Tokenizer};
pub use pipeline::{HighlightResult, Highlighter, PipelineError};
pub use render::{encode, stringify};
pub use tokens::{Token, TokenContent, TokenNode};
