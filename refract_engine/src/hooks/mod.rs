//! Typed extension points
//!
//! Each hook name carries its own environment type. Handlers run in
//! registration order and the first error stops the run and is returned to
//! the caller unchanged.

pub mod builtin;

use crate::grammar::GrammarId;
use crate::logging::codes;
use crate::log_error;
use crate::tokens::TokenNode;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HookError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn error_code(&self) -> crate::logging::Code {
        codes::hooks::HANDLER_FAILED
    }
}

/// Every extension point the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    BeforeTokenize,
    AfterTokenize,
    Wrap,
    BeforeSanityCheck,
    BeforeHighlight,
    BeforeInsert,
    AfterHighlight,
    Complete,
}

impl HookName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeTokenize => "before-tokenize",
            Self::AfterTokenize => "after-tokenize",
            Self::Wrap => "wrap",
            Self::BeforeSanityCheck => "before-sanity-check",
            Self::BeforeHighlight => "before-highlight",
            Self::BeforeInsert => "before-insert",
            Self::AfterHighlight => "after-highlight",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages of a block highlight, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightStage {
    BeforeSanityCheck,
    BeforeHighlight,
    BeforeInsert,
    AfterHighlight,
    Complete,
}

impl From<HighlightStage> for HookName {
    fn from(stage: HighlightStage) -> Self {
        match stage {
            HighlightStage::BeforeSanityCheck => HookName::BeforeSanityCheck,
            HighlightStage::BeforeHighlight => HookName::BeforeHighlight,
            HighlightStage::BeforeInsert => HookName::BeforeInsert,
            HighlightStage::AfterHighlight => HookName::AfterHighlight,
            HighlightStage::Complete => HookName::Complete,
        }
    }
}

// ============================================================================
// ENVIRONMENTS
// ============================================================================

/// Environment of `before-tokenize` and `after-tokenize`.
///
/// `before-tokenize` may rewrite `code` or swap `grammar`; `after-tokenize`
/// may rewrite `tokens`.
#[derive(Debug, Clone, Default)]
pub struct TokenizeEnv {
    pub code: String,
    pub language: String,
    pub grammar: Option<GrammarId>,
    pub tokens: Vec<TokenNode>,
}

/// Environment of `wrap`, built for every token the serializer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapEnv {
    pub token_type: String,
    /// Rendered inner markup
    pub content: String,
    pub tag: String,
    pub classes: Vec<String>,
    /// Emitted in insertion order
    pub attributes: Vec<(String, String)>,
    pub language: String,
}

impl WrapEnv {
    /// Set an attribute, keeping the position of an existing one
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Environment shared by the block highlight stages
#[derive(Debug, Clone, Default)]
pub struct HighlightEnv {
    pub code: String,
    pub language: String,
    pub grammar: Option<GrammarId>,
    pub highlighted: Option<String>,
}

// ============================================================================
// HANDLER LISTS
// ============================================================================

pub type Handler<C> = Box<dyn Fn(&mut C) -> Result<(), HookError> + Send + Sync>;

/// Ordered handlers for one hook
pub struct HookList<C> {
    handlers: Vec<Handler<C>>,
}

impl<C> HookList<C> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add<F>(&mut self, handler: F)
    where
        F: Fn(&mut C) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn run(&self, env: &mut C) -> Result<(), HookError> {
        for handler in &self.handlers {
            handler(env)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl<C> Default for HookList<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for HookList<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookList")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

// ============================================================================
// HOOK BUS
// ============================================================================

/// Handlers for every extension point, owned by one highlighter
#[derive(Debug, Default)]
pub struct HookBus {
    before_tokenize: HookList<TokenizeEnv>,
    after_tokenize: HookList<TokenizeEnv>,
    wrap: HookList<WrapEnv>,
    before_sanity_check: HookList<HighlightEnv>,
    before_highlight: HookList<HighlightEnv>,
    before_insert: HookList<HighlightEnv>,
    after_highlight: HookList<HighlightEnv>,
    complete: HookList<HighlightEnv>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_before_tokenize<F>(&mut self, handler: F)
    where
        F: Fn(&mut TokenizeEnv) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.before_tokenize.add(handler);
    }

    pub fn on_after_tokenize<F>(&mut self, handler: F)
    where
        F: Fn(&mut TokenizeEnv) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.after_tokenize.add(handler);
    }

    pub fn on_wrap<F>(&mut self, handler: F)
    where
        F: Fn(&mut WrapEnv) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.wrap.add(handler);
    }

    pub fn on_highlight<F>(&mut self, stage: HighlightStage, handler: F)
    where
        F: Fn(&mut HighlightEnv) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.stage_mut(stage).add(handler);
    }

    pub fn run_before_tokenize(&self, env: &mut TokenizeEnv) -> Result<(), HookError> {
        report(HookName::BeforeTokenize, self.before_tokenize.run(env))
    }

    pub fn run_after_tokenize(&self, env: &mut TokenizeEnv) -> Result<(), HookError> {
        report(HookName::AfterTokenize, self.after_tokenize.run(env))
    }

    pub fn run_wrap(&self, env: &mut WrapEnv) -> Result<(), HookError> {
        report(HookName::Wrap, self.wrap.run(env))
    }

    pub fn run_highlight(
        &self,
        stage: HighlightStage,
        env: &mut HighlightEnv,
    ) -> Result<(), HookError> {
        report(stage.into(), self.stage(stage).run(env))
    }

    /// Number of handlers registered for `name`
    pub fn handler_count(&self, name: HookName) -> usize {
        match name {
            HookName::BeforeTokenize => self.before_tokenize.len(),
            HookName::AfterTokenize => self.after_tokenize.len(),
            HookName::Wrap => self.wrap.len(),
            HookName::BeforeSanityCheck => self.before_sanity_check.len(),
            HookName::BeforeHighlight => self.before_highlight.len(),
            HookName::BeforeInsert => self.before_insert.len(),
            HookName::AfterHighlight => self.after_highlight.len(),
            HookName::Complete => self.complete.len(),
        }
    }

    /// Drop every handler of `name`
    pub fn clear(&mut self, name: HookName) {
        match name {
            HookName::BeforeTokenize => self.before_tokenize.clear(),
            HookName::AfterTokenize => self.after_tokenize.clear(),
            HookName::Wrap => self.wrap.clear(),
            HookName::BeforeSanityCheck => self.before_sanity_check.clear(),
            HookName::BeforeHighlight => self.before_highlight.clear(),
            HookName::BeforeInsert => self.before_insert.clear(),
            HookName::AfterHighlight => self.after_highlight.clear(),
            HookName::Complete => self.complete.clear(),
        }
    }

    fn stage(&self, stage: HighlightStage) -> &HookList<HighlightEnv> {
        match stage {
            HighlightStage::BeforeSanityCheck => &self.before_sanity_check,
            HighlightStage::BeforeHighlight => &self.before_highlight,
            HighlightStage::BeforeInsert => &self.before_insert,
            HighlightStage::AfterHighlight => &self.after_highlight,
            HighlightStage::Complete => &self.complete,
        }
    }

    fn stage_mut(&mut self, stage: HighlightStage) -> &mut HookList<HighlightEnv> {
        match stage {
            HighlightStage::BeforeSanityCheck => &mut self.before_sanity_check,
            HighlightStage::BeforeHighlight => &mut self.before_highlight,
            HighlightStage::BeforeInsert => &mut self.before_insert,
            HighlightStage::AfterHighlight => &mut self.after_highlight,
            HighlightStage::Complete => &mut self.complete,
        }
    }
}

fn report(hook: HookName, result: Result<(), HookError>) -> Result<(), HookError> {
    if let Err(error) = &result {
        log_error!(error.error_code(), "Hook handler failed",
            "hook" => hook,
            "error" => error
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn wrap_env() -> WrapEnv {
        WrapEnv {
            token_type: "keyword".to_string(),
            content: "if".to_string(),
            tag: "span".to_string(),
            classes: vec!["token".to_string(), "keyword".to_string()],
            attributes: Vec::new(),
            language: "clike".to_string(),
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut bus = HookBus::new();
        bus.on_before_tokenize(|env| {
            env.code.push('a');
            Ok(())
        });
        bus.on_before_tokenize(|env| {
            env.code.push('b');
            Ok(())
        });

        let mut env = TokenizeEnv {
            code: ">".to_string(),
            ..TokenizeEnv::default()
        };
        bus.run_before_tokenize(&mut env).unwrap();
        assert_eq!(env.code, ">ab");
        assert_eq!(bus.handler_count(HookName::BeforeTokenize), 2);
        assert_eq!(bus.handler_count(HookName::AfterTokenize), 0);
    }

    #[test]
    fn test_error_stops_later_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut bus = HookBus::new();

        bus.on_wrap(|_| Err(HookError::msg("rejected")));
        let counter = Arc::clone(&calls);
        bus.on_wrap(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let result = bus.run_wrap(&mut wrap_env());
        assert_matches!(result, Err(HookError::Message(ref message)) if message == "rejected");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_highlight_stages_are_separate() {
        let mut bus = HookBus::new();
        bus.on_highlight(HighlightStage::BeforeInsert, |env| {
            env.highlighted = Some(format!("<pre>{}</pre>", env.code));
            Ok(())
        });

        let mut env = HighlightEnv {
            code: "x".to_string(),
            ..HighlightEnv::default()
        };
        bus.run_highlight(HighlightStage::Complete, &mut env).unwrap();
        assert!(env.highlighted.is_none());

        bus.run_highlight(HighlightStage::BeforeInsert, &mut env).unwrap();
        assert_eq!(env.highlighted.as_deref(), Some("<pre>x</pre>"));

        bus.clear(HookName::BeforeInsert);
        assert_eq!(bus.handler_count(HookName::BeforeInsert), 0);
    }

    #[test]
    fn test_boxed_errors_pass_through() {
        let mut bus = HookBus::new();
        bus.on_after_tokenize(|_| {
            let parse: Result<u8, _> = "300".parse::<u8>();
            parse.map(|_| ()).map_err(|error| HookError::Other(Box::new(error)))
        });

        let err = bus.run_after_tokenize(&mut TokenizeEnv::default()).unwrap_err();
        assert_matches!(err, HookError::Other(_));
        assert_eq!(err.error_code(), codes::hooks::HANDLER_FAILED);
    }

    #[test]
    fn test_set_attribute_keeps_position() {
        let mut env = wrap_env();
        env.set_attribute("title", "first");
        env.set_attribute("data-x", "1");
        env.set_attribute("title", "second");

        assert_eq!(
            env.attributes,
            vec![
                ("title".to_string(), "second".to_string()),
                ("data-x".to_string(), "1".to_string()),
            ]
        );
        assert_eq!(env.attribute("data-x"), Some("1"));
        assert_eq!(HookName::from(HighlightStage::Complete).as_str(), "complete");
    }
}
