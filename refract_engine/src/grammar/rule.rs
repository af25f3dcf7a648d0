//! Pattern rules

use super::{GrammarError, GrammarId};
use regex::{Captures, Regex};

/// One pattern plus its matching flags and optional nested grammar
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    lookbehind: bool,
    greedy: bool,
    alias: Vec<String>,
    inside: Option<GrammarId>,
}

/// A match with any lookbehind prefix already trimmed off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    /// Byte offset of the claimed content in the searched text
    pub start: usize,
    pub end: usize,
}

impl RuleMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Rule {
    /// Compile a rule from a regular expression
    pub fn new(pattern: &str) -> Result<Self, GrammarError> {
        let pattern = Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern,
            lookbehind: false,
            greedy: false,
            alias: Vec::new(),
            inside: None,
        })
    }

    /// Exclude capture group 1 from the claimed span
    pub fn with_lookbehind(mut self, lookbehind: bool) -> Result<Self, GrammarError> {
        // captures_len counts the implicit whole-match group
        if lookbehind && self.pattern.captures_len() < 2 {
            return Err(GrammarError::LookbehindWithoutGroup {
                pattern: self.pattern.as_str().to_string(),
            });
        }
        self.lookbehind = lookbehind;
        Ok(self)
    }

    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_inside(mut self, inside: GrammarId) -> Self {
        self.inside = Some(inside);
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    pub fn is_lookbehind(&self) -> bool {
        self.lookbehind
    }

    pub fn alias(&self) -> &[String] {
        &self.alias
    }

    pub fn inside(&self) -> Option<GrammarId> {
        self.inside
    }

    pub(crate) fn set_inside(&mut self, inside: Option<GrammarId>) {
        self.inside = inside;
    }

    /// Search `haystack` from byte offset `start`. Anchors and word boundaries
    /// still see the text before `start`.
    pub fn find_at(&self, haystack: &str, start: usize) -> Option<RuleMatch> {
        self.pattern
            .captures_at(haystack, start)
            .map(|captures| self.trim(&captures))
    }

    fn trim(&self, captures: &Captures<'_>) -> RuleMatch {
        let whole = captures
            .get(0)
            .map(|m| (m.start(), m.end()))
            .unwrap_or_default();

        let prefix = if self.lookbehind {
            captures.get(1).map(|group| group.len()).unwrap_or(0)
        } else {
            0
        };

        RuleMatch {
            start: whole.0 + prefix,
            end: whole.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_invalid_pattern() {
        assert_matches!(Rule::new("(unclosed"), Err(GrammarError::InvalidPattern { .. }));
    }

    #[test]
    fn test_lookbehind_requires_group() {
        let rule = Rule::new(r"\d+").unwrap();
        assert_matches!(
            rule.with_lookbehind(true),
            Err(GrammarError::LookbehindWithoutGroup { .. })
        );
    }

    #[test]
    fn test_lookbehind_trims_prefix() {
        let rule = Rule::new(r"(\s)\d+")
            .unwrap()
            .with_lookbehind(true)
            .unwrap();
        let found = rule.find_at("x 42", 0).unwrap();

        assert_eq!(found, RuleMatch { start: 2, end: 4 });
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_unmatched_lookbehind_group_claims_whole_match() {
        let rule = Rule::new(r"(^|[^\\])?#.*")
            .unwrap()
            .with_lookbehind(true)
            .unwrap();
        let found = rule.find_at("#note", 0).unwrap();
        assert_eq!(found, RuleMatch { start: 0, end: 5 });
    }

    #[test]
    fn test_find_at_sees_preceding_context() {
        let rule = Rule::new(r"^\w+").unwrap();
        assert!(rule.find_at("ab cd", 3).is_none());

        let boundary = Rule::new(r"\bcd").unwrap();
        assert_eq!(boundary.find_at("ab cd", 1), Some(RuleMatch { start: 3, end: 5 }));
    }

    #[test]
    fn test_builder_flags() {
        let rule = Rule::new("a")
            .unwrap()
            .with_greedy(true)
            .with_alias("x")
            .with_aliases(["y", "z"]);

        assert!(rule.is_greedy());
        assert!(!rule.is_lookbehind());
        assert_eq!(rule.alias(), ["x", "y", "z"]);
        assert!(rule.inside().is_none());
    }
}
