//! Grammar documents
//!
//! Language tables are data. A document lists languages (each optionally
//! extending a registered base or carrying a `rest` reference) and
//! insert-before edits, in TOML or JSON:
//!
//! ```toml
//! [[language]]
//! name = "clike"
//! aliases = ["c-like"]
//!
//! [[language.token]]
//! name = "comment"
//! rules = [{ pattern = '(^|[^\\])//.*', lookbehind = true, greedy = true }]
//!
//! [[insert_before]]
//! container = "clike"
//! anchor = "comment"
//! [[insert_before.token]]
//! name = "directive"
//! pattern = '^#\w+'
//! ```
//!
//! A document is applied to a staged copy of the registry and committed only
//! when every language and edit resolved.

use super::composition::{extend, insert_before, CompositionError, CompositionRoot};
use super::{Grammar, GrammarError, GrammarId, GrammarRegistry, Rule};
use crate::config::compile_time::loader::*;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Grammar document errors
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Cannot read grammar document {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Grammar document {path} is {size} bytes (max {MAX_DOCUMENT_SIZE})")]
    DocumentTooLarge { path: String, size: u64 },

    #[error("Invalid TOML grammar document: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON grammar document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("'{language}' refers to unknown language '{reference}'")]
    UnresolvedReference { language: String, reference: String },

    #[error("Token '{token}' of '{language}': {reason}")]
    InvalidRule {
        language: String,
        token: String,
        reason: String,
    },

    #[error("Document defines {count} languages (max {MAX_LANGUAGES})")]
    TooManyLanguages { count: usize },

    #[error("Unsupported grammar document format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

impl LoaderError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::Io { .. } => codes::loader::IO_ERROR,
            Self::DocumentTooLarge { .. } => codes::loader::DOCUMENT_TOO_LARGE,
            Self::Toml(_) | Self::Json(_) => codes::loader::PARSE_ERROR,
            Self::UnresolvedReference { .. } => codes::loader::UNRESOLVED_REFERENCE,
            Self::InvalidRule { .. } => codes::loader::INVALID_RULE,
            Self::TooManyLanguages { .. } => codes::loader::TOO_MANY_LANGUAGES,
            Self::UnsupportedFormat { .. } => codes::loader::UNSUPPORTED_FORMAT,
            Self::Grammar(error) => error.error_code(),
            Self::Composition(error) => error.error_code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

// ============================================================================
// DOCUMENT MODEL
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrammarDocument {
    #[serde(default, rename = "language")]
    pub languages: Vec<LanguageDef>,
    #[serde(default)]
    pub insert_before: Vec<InsertBeforeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Registered language to deep-clone before applying `tokens`
    pub extends: Option<String>,
    pub rest: Option<String>,
    #[serde(default, rename = "token")]
    pub tokens: Vec<TokenDef>,
}

/// A token type: either a `rules` list or a single inline rule
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenDef {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
    pub pattern: Option<String>,
    #[serde(default)]
    pub lookbehind: bool,
    #[serde(default)]
    pub greedy: bool,
    pub alias: Option<AliasDef>,
    pub inside: Option<InsideDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub pattern: String,
    #[serde(default)]
    pub lookbehind: bool,
    #[serde(default)]
    pub greedy: bool,
    pub alias: Option<AliasDef>,
    pub inside: Option<InsideDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AliasDef {
    One(String),
    Many(Vec<String>),
}

impl AliasDef {
    fn names(&self) -> &[String] {
        match self {
            AliasDef::One(name) => std::slice::from_ref(name),
            AliasDef::Many(names) => names,
        }
    }
}

/// Nested grammar of a rule: a language name or an anonymous token list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InsideDef {
    Language(String),
    Tokens(Vec<TokenDef>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertBeforeDef {
    pub container: String,
    pub anchor: String,
    #[serde(default, rename = "token")]
    pub tokens: Vec<TokenDef>,
}

/// What applying a document changed
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub languages: Vec<String>,
    pub aliases: usize,
    pub insertions: usize,
}

impl TokenDef {
    fn rule_defs(&self, language: &str) -> Result<Vec<RuleDef>, LoaderError> {
        let invalid = |reason: &str| LoaderError::InvalidRule {
            language: language.to_string(),
            token: self.name.clone(),
            reason: reason.to_string(),
        };

        match (&self.pattern, self.rules.is_empty()) {
            (Some(pattern), true) => Ok(vec![RuleDef {
                pattern: pattern.clone(),
                lookbehind: self.lookbehind,
                greedy: self.greedy,
                alias: self.alias.clone(),
                inside: self.inside.clone(),
            }]),
            (None, false) => {
                if self.lookbehind || self.greedy || self.alias.is_some() || self.inside.is_some() {
                    return Err(invalid("rule flags belong on the entries of `rules`"));
                }
                Ok(self.rules.clone())
            }
            (Some(_), false) => Err(invalid("has both `pattern` and `rules`")),
            (None, true) => Err(invalid("needs a `pattern` or a non-empty `rules` list")),
        }
    }
}

// ============================================================================
// PARSING
// ============================================================================

impl GrammarDocument {
    pub fn from_toml_str(content: &str) -> Result<Self, LoaderError> {
        let document: Self = toml::from_str(content)?;
        document.check_limits()?;
        Ok(document)
    }

    pub fn from_json_str(content: &str) -> Result<Self, LoaderError> {
        let document: Self = serde_json::from_str(content)?;
        document.check_limits()?;
        Ok(document)
    }

    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, LoaderError> {
        match format {
            DocumentFormat::Toml => Self::from_toml_str(content),
            DocumentFormat::Json => Self::from_json_str(content),
        }
    }

    /// Read a `.toml` or `.json` document
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            LoaderError::UnsupportedFormat {
                path: display.clone(),
            }
        })?;

        let metadata = fs::metadata(path).map_err(|source| LoaderError::Io {
            path: display.clone(),
            source,
        })?;
        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(LoaderError::DocumentTooLarge {
                path: display,
                size: metadata.len(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: display.clone(),
            source,
        })?;

        let document = Self::parse(&content, format)?;
        log_debug!("Grammar document parsed",
            "path" => display,
            "languages" => document.languages.len(),
            "insertions" => document.insert_before.len()
        );
        Ok(document)
    }

    fn check_limits(&self) -> Result<(), LoaderError> {
        if self.languages.len() > MAX_LANGUAGES {
            return Err(LoaderError::TooManyLanguages {
                count: self.languages.len(),
            });
        }
        Ok(())
    }

    pub fn language_names(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|language| language.name.as_str())
    }

    // ========================================================================
    // APPLICATION
    // ========================================================================

    /// Register the document's languages, then run its insert-before edits.
    ///
    /// References resolve against the registry as built so far, so a language
    /// may refer to itself and to anything defined before it.
    pub fn apply(&self, registry: &mut GrammarRegistry) -> Result<LoadSummary, LoaderError> {
        let mut staged = registry.clone();
        let mut summary = LoadSummary::default();

        for language in &self.languages {
            let id = match &language.extends {
                Some(base) => {
                    if !staged.contains_language(base) {
                        return Err(unresolved(&language.name, base));
                    }
                    extend(&mut staged, base, Grammar::new())?
                }
                None => staged.add(Grammar::new()),
            };
            staged.bind(language.name.clone(), id);

            for token in &language.tokens {
                let rules = compile_token(&mut staged, &language.name, token)?;
                staged.get_mut(id)?.set(token.name.clone(), rules);
            }

            if let Some(rest) = &language.rest {
                let rest_id = staged
                    .resolve(rest)
                    .ok_or_else(|| unresolved(&language.name, rest))?;
                staged.get_mut(id)?.set_rest(Some(rest_id));
            }

            for alias in &language.aliases {
                staged.bind(alias.clone(), id);
                summary.aliases += 1;
            }

            summary.languages.push(language.name.clone());
        }

        for edit in &self.insert_before {
            let mut entries = Grammar::new();
            for token in &edit.tokens {
                let rules = compile_token(&mut staged, &edit.container, token)?;
                entries.set(token.name.clone(), rules);
            }
            insert_before(
                &mut staged,
                CompositionRoot::Languages,
                &edit.container,
                &edit.anchor,
                entries,
            )?;
            summary.insertions += 1;
        }

        *registry = staged;

        log_success!(codes::success::GRAMMAR_DOCUMENT_LOADED, "Grammar document applied",
            "languages" => summary.languages.len(),
            "aliases" => summary.aliases,
            "insertions" => summary.insertions
        );

        Ok(summary)
    }
}

/// Load a document from disk and apply it
pub fn load_into(
    registry: &mut GrammarRegistry,
    path: impl AsRef<Path>,
) -> Result<LoadSummary, LoaderError> {
    let path = path.as_ref();
    let result = GrammarDocument::load(path).and_then(|document| document.apply(registry));

    if let Err(error) = &result {
        log_error!(error.error_code(), "Failed to load grammar document",
            "path" => path.display(),
            "error" => error
        );
    }

    result
}

fn unresolved(language: &str, reference: &str) -> LoaderError {
    LoaderError::UnresolvedReference {
        language: language.to_string(),
        reference: reference.to_string(),
    }
}

fn compile_token(
    registry: &mut GrammarRegistry,
    language: &str,
    token: &TokenDef,
) -> Result<Vec<Rule>, LoaderError> {
    token
        .rule_defs(language)?
        .iter()
        .map(|def| compile_rule(registry, language, def))
        .collect()
}

fn compile_rule(
    registry: &mut GrammarRegistry,
    language: &str,
    def: &RuleDef,
) -> Result<Rule, LoaderError> {
    let mut rule = Rule::new(&def.pattern)?
        .with_lookbehind(def.lookbehind)?
        .with_greedy(def.greedy);

    if let Some(alias) = &def.alias {
        rule = rule.with_aliases(alias.names().iter().cloned());
    }

    if let Some(inside) = &def.inside {
        let nested = resolve_inside(registry, language, inside)?;
        rule = rule.with_inside(nested);
    }

    Ok(rule)
}

fn resolve_inside(
    registry: &mut GrammarRegistry,
    language: &str,
    inside: &InsideDef,
) -> Result<GrammarId, LoaderError> {
    match inside {
        InsideDef::Language(name) => registry
            .resolve(name)
            .ok_or_else(|| unresolved(language, name)),
        InsideDef::Tokens(tokens) => {
            let mut grammar = Grammar::new();
            for token in tokens {
                let rules = compile_token(registry, language, token)?;
                grammar.set(token.name.clone(), rules);
            }
            Ok(registry.add(grammar))
        }
    }
}
