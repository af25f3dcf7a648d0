//! Grammar arena and language bindings

use super::{Grammar, GrammarError, GrammarId};
use std::collections::BTreeMap;

/// Language names bound to the shared empty grammar of a fresh registry
pub const PLAIN_TEXT_LANGUAGES: [&str; 4] = ["plain", "plaintext", "text", "txt"];

/// Owns every grammar and maps language names onto them.
///
/// Several names may bind the same [`GrammarId`]; edits made through one are
/// visible through all of them.
#[derive(Debug, Clone)]
pub struct GrammarRegistry {
    grammars: Vec<Grammar>,
    languages: BTreeMap<String, GrammarId>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let plain = registry.add(Grammar::new());
        for name in PLAIN_TEXT_LANGUAGES {
            registry.bind(name, plain);
        }
        registry
    }

    /// Registry without the plain-text bindings
    pub fn empty() -> Self {
        Self {
            grammars: Vec::new(),
            languages: BTreeMap::new(),
        }
    }

    /// Store a grammar without binding a name to it
    pub fn add(&mut self, grammar: Grammar) -> GrammarId {
        let id = GrammarId(self.grammars.len());
        self.grammars.push(grammar);
        id
    }

    /// Store a grammar and bind `name` to it, replacing any earlier binding
    pub fn register(&mut self, name: impl Into<String>, grammar: Grammar) -> GrammarId {
        let id = self.add(grammar);
        self.bind(name, id);
        id
    }

    /// Bind `name` to an existing grammar; returns the previous binding
    pub fn bind(&mut self, name: impl Into<String>, id: GrammarId) -> Option<GrammarId> {
        self.languages.insert(name.into(), id)
    }

    /// Bind `alias` to the grammar `target` is bound to
    pub fn alias(
        &mut self,
        alias: impl Into<String>,
        target: &str,
    ) -> Result<GrammarId, GrammarError> {
        let id = self
            .resolve(target)
            .ok_or_else(|| GrammarError::UnknownLanguage(target.to_string()))?;
        self.bind(alias, id);
        Ok(id)
    }

    pub fn resolve(&self, name: &str) -> Option<GrammarId> {
        self.languages.get(name).copied()
    }

    pub fn get(&self, id: GrammarId) -> Result<&Grammar, GrammarError> {
        self.grammars
            .get(id.0)
            .ok_or(GrammarError::UnknownGrammarId(id))
    }

    pub fn get_mut(&mut self, id: GrammarId) -> Result<&mut Grammar, GrammarError> {
        self.grammars
            .get_mut(id.0)
            .ok_or(GrammarError::UnknownGrammarId(id))
    }

    /// Grammar bound to a language name
    pub fn grammar(&self, name: &str) -> Result<&Grammar, GrammarError> {
        let id = self
            .resolve(name)
            .ok_or_else(|| GrammarError::UnknownLanguage(name.to_string()))?;
        self.get(id)
    }

    pub fn contains_language(&self, name: &str) -> bool {
        self.languages.contains_key(name)
    }

    /// Bound language names in sorted order
    pub fn languages(&self) -> impl Iterator<Item = (&str, GrammarId)> {
        self.languages.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Names bound to `id`
    pub fn names_of(&self, id: GrammarId) -> Vec<&str> {
        self.languages()
            .filter(|(_, bound)| *bound == id)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn language_count(&self) -> usize {
        self.languages.len()
    }

    /// Grammars stored, bound or not
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub(crate) fn bindings_mut(&mut self) -> impl Iterator<Item = (&str, &mut GrammarId)> {
        self.languages
            .iter_mut()
            .map(|(name, id)| (name.as_str(), id))
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;
    use assert_matches::assert_matches;

    #[test]
    fn test_plain_text_aliases_share_grammar() {
        let registry = GrammarRegistry::new();
        let plain = registry.resolve("plain").unwrap();

        for name in PLAIN_TEXT_LANGUAGES {
            assert_eq!(registry.resolve(name), Some(plain));
        }
        assert!(registry.get(plain).unwrap().is_empty());
        assert_eq!(registry.names_of(plain).len(), 4);
    }

    #[test]
    fn test_register_and_alias() {
        let mut registry = GrammarRegistry::new();
        let grammar = Grammar::new().with_entry("number", vec![Rule::new(r"\d+").unwrap()]);
        let id = registry.register("calc", grammar);

        assert_eq!(registry.alias("calculator", "calc").unwrap(), id);
        assert_eq!(registry.resolve("calculator"), Some(id));
        assert!(registry.grammar("calculator").unwrap().contains("number"));
    }

    #[test]
    fn test_unknown_lookups() {
        let mut registry = GrammarRegistry::empty();

        assert_matches!(
            registry.alias("x", "missing"),
            Err(GrammarError::UnknownLanguage(name)) if name == "missing"
        );
        assert_matches!(
            registry.get(GrammarId(42)),
            Err(GrammarError::UnknownGrammarId(GrammarId(42)))
        );
        assert_matches!(registry.grammar("missing"), Err(GrammarError::UnknownLanguage(_)));
    }

    #[test]
    fn test_rebinding_returns_previous() {
        let mut registry = GrammarRegistry::empty();
        let first = registry.register("lang", Grammar::new());
        let second = registry.add(Grammar::new());

        assert_eq!(registry.bind("lang", second), Some(first));
        assert_eq!(registry.resolve("lang"), Some(second));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.language_count(), 1);
    }
}
