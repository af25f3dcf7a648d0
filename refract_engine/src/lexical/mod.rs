//! Tokenization of source text against registry grammars

pub mod analyzer;

pub use analyzer::{LexerError, TokenizeMetrics, Tokenizer};

use crate::config::runtime::TokenizerPreferences;
use crate::grammar::{GrammarId, GrammarRegistry};
use crate::tokens::TokenNode;

/// Tokenize with explicit preferences, discarding metrics
pub fn tokenize(
    text: &str,
    grammar: GrammarId,
    registry: &GrammarRegistry,
    preferences: &TokenizerPreferences,
) -> Result<Vec<TokenNode>, LexerError> {
    Tokenizer::with_preferences(registry, preferences.clone()).tokenize(text, grammar)
}

/// Tokenize and return the metrics of the run alongside the tokens
pub fn tokenize_with_metrics(
    text: &str,
    grammar: GrammarId,
    registry: &GrammarRegistry,
    preferences: &TokenizerPreferences,
) -> Result<(Vec<TokenNode>, TokenizeMetrics), LexerError> {
    let mut tokenizer = Tokenizer::with_preferences(registry, preferences.clone());
    let tokens = tokenizer.tokenize(text, grammar)?;
    Ok((tokens, tokenizer.metrics().clone()))
}
