//! Grammar model, registry, composition and document loading
//!
//! A [`Grammar`] is an ordered list of `(type name, rules)` entries; entry order
//! is match priority. Grammars live in a [`GrammarRegistry`] arena and refer to
//! each other by [`GrammarId`], so several language names (and several rules)
//! can share one grammar and see edits made through any of them.

pub mod composition;
pub mod loader;
pub mod registry;
pub mod rule;

pub use composition::{extend, insert_before, CompositionError, CompositionRoot};
pub use loader::{GrammarDocument, LoaderError};
pub use registry::{GrammarRegistry, PLAIN_TEXT_LANGUAGES};
pub use rule::{Rule, RuleMatch};

/// Stable identity of a grammar inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(pub(crate) usize);

impl GrammarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for GrammarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grammar configuration errors
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("Language '{0}' has no grammar")]
    UnknownLanguage(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Lookbehind rule '{pattern}' has no capture group")]
    LookbehindWithoutGroup { pattern: String },

    #[error("Grammar {0} is not part of this registry")]
    UnknownGrammarId(GrammarId),
}

impl GrammarError {
    pub fn error_code(&self) -> crate::logging::Code {
        use crate::logging::codes;
        match self {
            Self::UnknownLanguage(_) => codes::grammar::UNKNOWN_LANGUAGE,
            Self::InvalidPattern { .. } => codes::grammar::INVALID_PATTERN,
            Self::LookbehindWithoutGroup { .. } => codes::grammar::LOOKBEHIND_WITHOUT_GROUP,
            Self::UnknownGrammarId(_) => codes::grammar::UNKNOWN_GRAMMAR,
        }
    }
}

/// A named token type and its alternative rules, tried in order
#[derive(Debug, Clone)]
pub struct GrammarEntry {
    pub name: String,
    pub rules: Vec<Rule>,
}

/// Ordered mapping from token type to rules
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    entries: Vec<GrammarEntry>,
    rest: Option<GrammarId>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Grammar::set`]
    pub fn with_entry(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.set(name, rules);
        self
    }

    /// Builder form of [`Grammar::set_rest`]
    pub fn with_rest(mut self, rest: GrammarId) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Replace an entry in place, or append it when the name is new
    pub fn set(&mut self, name: impl Into<String>, rules: Vec<Rule>) {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.entries[index].rules = rules,
            None => self.entries.push(GrammarEntry { name, rules }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<Rule>> {
        let index = self.position(name)?;
        Some(self.entries.remove(index).rules)
    }

    pub fn get(&self, name: &str) -> Option<&[Rule]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.rules.as_slice())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn entries(&self) -> &[GrammarEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [GrammarEntry] {
        &mut self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn rest(&self) -> Option<GrammarId> {
        self.rest
    }

    pub fn set_rest(&mut self, rest: Option<GrammarId>) {
        self.rest = rest;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries of its own; `rest` may still contribute some
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grammar ids this grammar refers to through `inside` and `rest`
    pub(crate) fn references(&self) -> impl Iterator<Item = GrammarId> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| entry.rules.iter().filter_map(Rule::inside))
            .chain(self.rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> Rule {
        Rule::new(pattern).unwrap()
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut grammar = Grammar::new()
            .with_entry("comment", vec![rule("#.*")])
            .with_entry("number", vec![rule(r"\d+")])
            .with_entry("string", vec![rule("'[^']*'")]);

        grammar.set("number", vec![rule(r"\d+\.\d+"), rule(r"\d+")]);
        grammar.set("operator", vec![rule("[+-]")]);

        let names: Vec<&str> = grammar.names().collect();
        assert_eq!(names, vec!["comment", "number", "string", "operator"]);
        assert_eq!(grammar.get("number").map(|rules| rules.len()), Some(2));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut grammar = Grammar::new()
            .with_entry("a", vec![rule("a")])
            .with_entry("b", vec![rule("b")])
            .with_entry("c", vec![rule("c")]);

        assert!(grammar.remove("b").is_some());
        assert!(grammar.remove("missing").is_none());
        assert_eq!(grammar.names().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_references() {
        let grammar = Grammar::new()
            .with_entry("tag", vec![rule("<[^>]+>").with_inside(GrammarId(4))])
            .with_entry("text", vec![rule("[^<]+")])
            .with_rest(GrammarId(7));

        let refs: Vec<GrammarId> = grammar.references().collect();
        assert_eq!(refs, vec![GrammarId(4), GrammarId(7)]);
        assert!(!grammar.is_empty());
        assert!(Grammar::new().is_empty());
    }

    #[test]
    fn test_rest_only_grammar_is_empty() {
        let grammar = Grammar::new().with_rest(GrammarId(2));
        assert_eq!(grammar.len(), 0);
        assert!(grammar.is_empty());
        assert_eq!(grammar.rest(), Some(GrammarId(2)));
    }
}
