//! Grammar-driven tokenizer
//!
//! Rules are applied entry by entry, rule by rule, over a [`TokenStream`] that
//! starts as one text leaf. Each claim splits a leaf into before / token /
//! after; claimed tokens are never revisited by later rules. Greedy rules
//! search the whole text from the walk offset and may cover several leaves.

use crate::config::compile_time::tokenizer::*;
use crate::config::runtime::{GreedyOverlap, TokenizerPreferences};
use crate::grammar::{GrammarId, GrammarRegistry, Rule, RuleMatch};
use crate::logging::codes;
use crate::tokens::{walk_tokens, NodeId, Token, TokenContent, TokenNode, TokenStream};
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Tokenizer errors
#[derive(Debug, thiserror::Error)]
pub enum LexerError {
    #[error(
        "Token stream grew to {stream_len} nodes for {text_len} characters while applying \
         '{token_type}'"
    )]
    PathologicalGrowth {
        stream_len: usize,
        text_len: usize,
        token_type: String,
    },

    #[error("Input too large: {size} bytes (max {MAX_INPUT_SIZE})")]
    InputTooLarge { size: usize },

    #[error("Nested grammar depth {depth} exceeds maximum {MAX_NESTING_DEPTH}")]
    NestingTooDeep { depth: usize },

    #[error("Grammar {0} is not part of the registry")]
    UnknownGrammar(GrammarId),

    #[error("Rule {rule} of '{token_type}' matched empty text at offset {offset}")]
    EmptyMatch {
        token_type: String,
        rule: usize,
        offset: usize,
    },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::PathologicalGrowth { .. } => codes::tokenizer::PATHOLOGICAL_GROWTH,
            Self::InputTooLarge { .. } => codes::tokenizer::INPUT_TOO_LARGE,
            Self::NestingTooDeep { .. } => codes::tokenizer::NESTING_TOO_DEEP,
            Self::UnknownGrammar(_) => codes::tokenizer::UNKNOWN_GRAMMAR,
            Self::EmptyMatch { .. } => codes::tokenizer::EMPTY_MATCH,
        }
    }
}

/// Counters for one tokenize call
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenizeMetrics {
    pub input_bytes: usize,
    pub input_chars: usize,
    /// Successful rule matches, displaced ones included
    pub claims: usize,
    /// Guarded re-entries after multi-node greedy claims
    pub rematches: usize,
    pub max_depth: usize,
    /// Tokens in the final tree, nested ones included
    pub token_count: usize,
    pub tokens_by_type: BTreeMap<String, usize>,
    pub duration_ms: f64,
}

impl TokenizeMetrics {
    fn record_tree(&mut self, nodes: &[TokenNode]) {
        walk_tokens(nodes, &mut |token, _| {
            self.token_count += 1;
            *self
                .tokens_by_type
                .entry(token.token_type.clone())
                .or_insert(0) += 1;
        });
    }
}

/// Re-entry guard for the pass that re-tokenizes after a multi-node claim
#[derive(Debug)]
struct RematchGuard<'g> {
    /// Entry name and rule index that produced the claim
    cause: (&'g str, usize),
    /// Farthest offset settled so far
    reach: usize,
}

/// Per-text state shared by a pass and its guarded re-entries
struct Pass<'t, 'g> {
    text: &'t str,
    char_count: usize,
    entries: Vec<(&'g str, &'g [Rule])>,
    depth: usize,
}

pub struct Tokenizer<'g> {
    registry: &'g GrammarRegistry,
    preferences: TokenizerPreferences,
    metrics: TokenizeMetrics,
}

impl<'g> Tokenizer<'g> {
    pub fn new(registry: &'g GrammarRegistry) -> Self {
        Self::with_preferences(registry, TokenizerPreferences::default())
    }

    pub fn with_preferences(
        registry: &'g GrammarRegistry,
        preferences: TokenizerPreferences,
    ) -> Self {
        Self {
            registry,
            preferences,
            metrics: TokenizeMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &TokenizeMetrics {
        &self.metrics
    }

    pub fn preferences(&self) -> &TokenizerPreferences {
        &self.preferences
    }

    /// Tokenize `text` with the grammar `grammar`
    pub fn tokenize(
        &mut self,
        text: &str,
        grammar: GrammarId,
    ) -> Result<Vec<TokenNode>, LexerError> {
        let start_time = Instant::now();
        self.metrics = TokenizeMetrics {
            input_bytes: text.len(),
            input_chars: text.chars().count(),
            ..TokenizeMetrics::default()
        };

        if text.len() > MAX_INPUT_SIZE {
            let error = LexerError::InputTooLarge { size: text.len() };
            log_error!(error.error_code(), "Input exceeds tokenizer limit",
                "size" => text.len(),
                "limit" => MAX_INPUT_SIZE
            );
            return Err(error);
        }

        let tokens = match self.tokenize_nested(text, grammar, 0) {
            Ok(tokens) => tokens,
            Err(error) => {
                log_error!(error.error_code(), &error.to_string(),
                    "grammar" => grammar,
                    "input_bytes" => text.len()
                );
                return Err(error);
            }
        };

        if self.preferences.collect_metrics {
            self.metrics.record_tree(&tokens);
        }
        self.metrics.duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "grammar" => grammar,
            "input_chars" => self.metrics.input_chars,
            "claims" => self.metrics.claims,
            "max_depth" => self.metrics.max_depth,
            "duration_ms" => format!("{:.3}", self.metrics.duration_ms)
        );

        Ok(tokens)
    }

    fn tokenize_nested(
        &mut self,
        text: &str,
        grammar: GrammarId,
        depth: usize,
    ) -> Result<Vec<TokenNode>, LexerError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(LexerError::NestingTooDeep { depth });
        }
        self.metrics.max_depth = self.metrics.max_depth.max(depth);

        if text.is_empty() {
            return Ok(vec![TokenNode::Text(String::new())]);
        }

        let pass = Pass {
            text,
            char_count: text.chars().count(),
            entries: self.effective_entries(grammar)?,
            depth,
        };

        let mut stream = TokenStream::from_text(text);
        let head = stream.head();
        self.match_grammar(&pass, &mut stream, head, 0, None)?;

        Ok(stream.into_values().collect())
    }

    /// The grammar's entries with its `rest` grammar merged in: same-named
    /// entries are replaced in place, new ones appended.
    fn effective_entries(
        &self,
        grammar: GrammarId,
    ) -> Result<Vec<(&'g str, &'g [Rule])>, LexerError> {
        let registry = self.registry;
        let own = registry
            .get(grammar)
            .map_err(|_| LexerError::UnknownGrammar(grammar))?;

        let mut entries: Vec<(&'g str, &'g [Rule])> = own
            .entries()
            .iter()
            .map(|entry| (entry.name.as_str(), entry.rules.as_slice()))
            .collect();

        if let Some(rest_id) = own.rest() {
            let rest = registry
                .get(rest_id)
                .map_err(|_| LexerError::UnknownGrammar(rest_id))?;
            for entry in rest.entries() {
                match entries.iter_mut().find(|(name, _)| *name == entry.name) {
                    Some(slot) => slot.1 = entry.rules.as_slice(),
                    None => entries.push((entry.name.as_str(), entry.rules.as_slice())),
                }
            }
        }

        Ok(entries)
    }

    fn match_grammar(
        &mut self,
        pass: &Pass<'_, 'g>,
        stream: &mut TokenStream,
        start_node: NodeId,
        start_pos: usize,
        mut guard: Option<&mut RematchGuard<'g>>,
    ) -> Result<(), LexerError> {
        let head = stream.head();
        let tail = stream.tail();

        for &(token_type, rules) in &pass.entries {
            for (index, rule) in rules.iter().enumerate() {
                if let Some(active) = guard.as_deref() {
                    if active.cause == (token_type, index) {
                        return Ok(());
                    }
                }

                let mut current = stream.next(start_node).unwrap_or(tail);
                let mut pos = start_pos;

                while current != tail {
                    if let Some(active) = guard.as_deref() {
                        if pos >= active.reach {
                            break;
                        }
                    }

                    if stream.len() > pass.char_count {
                        return Err(LexerError::PathologicalGrowth {
                            stream_len: stream.len(),
                            text_len: pass.char_count,
                            token_type: token_type.to_string(),
                        });
                    }

                    if stream.is_token(current) {
                        pos += stream.width(current);
                        current = stream.next(current).unwrap_or(tail);
                        continue;
                    }

                    let mut remove_count = 1;
                    let segment: &str;
                    let found: RuleMatch;

                    if rule.is_greedy() {
                        let Some(hit) = rule.find_at(pass.text, pos) else {
                            break;
                        };
                        if hit.start >= pass.text.len() {
                            break;
                        }

                        // Move to the node holding the match start
                        let mut node_end = pos + stream.width(current);
                        while hit.start >= node_end {
                            match stream.next(current) {
                                Some(next) if next != tail => {
                                    current = next;
                                    node_end += stream.width(current);
                                }
                                _ => break,
                            }
                        }
                        pos = node_end - stream.width(current);

                        if stream.is_token(current) {
                            pos += stream.width(current);
                            current = stream.next(current).unwrap_or(tail);
                            continue;
                        }

                        // Collect the nodes the match covers, plus a trailing leaf
                        let mut covered_end = pos;
                        let mut straddles = false;
                        let mut node = current;
                        while node != tail && (covered_end < hit.end || !stream.is_token(node)) {
                            if stream.is_token(node) {
                                straddles = true;
                                if self.preferences.greedy_overlap == GreedyOverlap::Skip {
                                    break;
                                }
                            }
                            remove_count += 1;
                            covered_end += stream.width(node);
                            node = stream.next(node).unwrap_or(tail);
                        }
                        remove_count -= 1;

                        if straddles && self.preferences.greedy_overlap == GreedyOverlap::Skip {
                            pos += stream.width(current);
                            current = stream.next(current).unwrap_or(tail);
                            continue;
                        }

                        segment = &pass.text[pos..covered_end];
                        found = RuleMatch {
                            start: hit.start - pos,
                            end: hit.end - pos,
                        };
                    } else {
                        segment = &pass.text[pos..pos + stream.width(current)];
                        match rule.find_at(segment, 0) {
                            Some(hit) => found = hit,
                            None => {
                                pos += stream.width(current);
                                current = stream.next(current).unwrap_or(tail);
                                continue;
                            }
                        }
                    }

                    if found.is_empty() {
                        return Err(LexerError::EmptyMatch {
                            token_type: token_type.to_string(),
                            rule: index,
                            offset: pos + found.start,
                        });
                    }

                    let matched = &segment[found.start..found.end];
                    let before = &segment[..found.start];
                    let after = &segment[found.end..];

                    let reach = pos + segment.len();
                    if let Some(active) = guard.as_deref_mut() {
                        active.reach = active.reach.max(reach);
                    }

                    let mut remove_from = stream.prev(current).unwrap_or(head);
                    if !before.is_empty() {
                        remove_from = stream.insert_after(remove_from, TokenNode::Text(before.to_string()));
                        pos += before.len();
                    }
                    stream.remove_range(remove_from, remove_count);

                    let content = match rule.inside() {
                        Some(inside) => TokenContent::Nested(self.tokenize_nested(
                            matched,
                            inside,
                            pass.depth + 1,
                        )?),
                        None => TokenContent::Text(matched.to_string()),
                    };
                    let token = Token::new(token_type, content, rule.alias().to_vec(), matched);

                    self.metrics.claims += 1;
                    if self.preferences.log_claims {
                        log_debug!("Token claimed",
                            "type" => token_type,
                            "rule" => index,
                            "offset" => pos,
                            "bytes" => matched.len(),
                            "depth" => pass.depth,
                            "nodes_replaced" => remove_count
                        );
                    }

                    current = stream.insert_after(remove_from, TokenNode::Token(token));
                    if !after.is_empty() {
                        stream.insert_after(current, TokenNode::Text(after.to_string()));
                    }

                    if remove_count > 1 {
                        // The claim swallowed settled nodes; re-run the earlier
                        // rules over what follows, but never this rule again.
                        let mut nested = RematchGuard {
                            cause: (token_type, index),
                            reach,
                        };
                        self.metrics.rematches += 1;
                        let restart = stream.prev(current).unwrap_or(head);
                        self.match_grammar(pass, stream, restart, pos, Some(&mut nested))?;

                        if let Some(active) = guard.as_deref_mut() {
                            active.reach = active.reach.max(nested.reach);
                        }
                    }

                    pos += stream.width(current);
                    current = stream.next(current).unwrap_or(tail);
                }
            }
        }

        Ok(())
    }
}
