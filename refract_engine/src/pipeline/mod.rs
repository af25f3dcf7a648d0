mod error;
mod result;

pub use error::PipelineError;
pub use result::HighlightResult;

use crate::config::compile_time::render::MAX_OUTPUT_SIZE;
use crate::config::RuntimeConfig;
use crate::grammar::loader::{self, LoadSummary};
use crate::grammar::{GrammarId, GrammarRegistry};
use crate::hooks::{HighlightEnv, HighlightStage, HookBus, TokenizeEnv};
use crate::lexical::{TokenizeMetrics, Tokenizer};
use crate::render::{self, encode, encode_text};
use crate::tokens::TokenNode;
use crate::{log_debug, log_error, log_info};
use std::path::Path;
use std::time::Instant;

/// Grammar registry, hook bus and preferences for one highlighting context
#[derive(Debug, Default)]
pub struct Highlighter {
    registry: GrammarRegistry,
    hooks: HookBus,
    config: RuntimeConfig,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            registry: GrammarRegistry::new(),
            hooks: HookBus::new(),
            config,
        }
    }

    pub fn with_registry(registry: GrammarRegistry, config: RuntimeConfig) -> Self {
        Self {
            registry,
            hooks: HookBus::new(),
            config,
        }
    }

    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut GrammarRegistry {
        &mut self.registry
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookBus {
        &mut self.hooks
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read a grammar document and add its languages to the registry
    pub fn load_grammar_document(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<LoadSummary, PipelineError> {
        Ok(loader::load_into(&mut self.registry, path)?)
    }

    pub fn tokenize(&self, text: &str, grammar: GrammarId) -> Result<Vec<TokenNode>, PipelineError> {
        Ok(self.tokenizer().tokenize(text, grammar)?)
    }

    pub fn tokenize_language(
        &self,
        text: &str,
        language: &str,
    ) -> Result<Vec<TokenNode>, PipelineError> {
        let grammar = self.resolve(language)?;
        self.tokenize(text, grammar)
    }

    /// Tokenize and render `code` with the grammar bound to `language`
    pub fn highlight(&self, code: &str, language: &str) -> Result<String, PipelineError> {
        let grammar = self.registry.resolve(language);
        let (markup, _) = self.highlight_code(code, grammar, language)?;
        Ok(markup)
    }

    /// Run the full block flow: sanity check, highlight (or plain encoding when
    /// the language has no grammar), insertion and completion stages.
    pub fn highlight_block(
        &self,
        code: &str,
        language: &str,
    ) -> Result<HighlightResult, PipelineError> {
        let start_time = Instant::now();
        log_info!("Highlighting block", "language" => language, "bytes" => code.len());

        let mut env = HighlightEnv {
            code: code.to_string(),
            language: language.to_string(),
            grammar: self.registry.resolve(language),
            highlighted: None,
        };

        self.run_stage(HighlightStage::BeforeSanityCheck, &mut env)?;

        if env.code.is_empty() {
            self.run_stage(HighlightStage::Complete, &mut env)?;
            return Ok(self.finish(env, false, None, start_time));
        }

        self.run_stage(HighlightStage::BeforeHighlight, &mut env)?;

        let (markup, metrics) = match env.grammar {
            Some(grammar) => {
                let (markup, metrics) = self.highlight_code(&env.code, Some(grammar), &env.language)?;
                (markup, Some(metrics))
            }
            None => {
                log_debug!("No grammar for block, encoding as plain text",
                    "language" => env.language
                );
                (self.encode_plain(&env.code), None)
            }
        };
        let tokenized = metrics.is_some();

        env.highlighted = Some(markup);
        self.run_stage(HighlightStage::BeforeInsert, &mut env)?;
        self.run_stage(HighlightStage::AfterHighlight, &mut env)?;
        self.run_stage(HighlightStage::Complete, &mut env)?;

        let metrics = metrics.filter(|_| self.config.tokenizer.collect_metrics);
        Ok(self.finish(env, tokenized, metrics, start_time))
    }

    fn highlight_code(
        &self,
        code: &str,
        grammar: Option<GrammarId>,
        language: &str,
    ) -> Result<(String, TokenizeMetrics), PipelineError> {
        let mut env = TokenizeEnv {
            code: code.to_string(),
            language: language.to_string(),
            grammar,
            tokens: Vec::new(),
        };
        self.hooks.run_before_tokenize(&mut env)?;

        let grammar = env
            .grammar
            .ok_or_else(|| PipelineError::UnknownLanguage(env.language.clone()))?;

        let mut tokenizer = self.tokenizer();
        env.tokens = tokenizer.tokenize(&env.code, grammar)?;
        self.hooks.run_after_tokenize(&mut env)?;

        let tokens = if self.config.render.encode_entities {
            encode(std::mem::take(&mut env.tokens))
        } else {
            std::mem::take(&mut env.tokens)
        };

        let markup = render::stringify_with(&tokens, &env.language, &self.hooks, &self.config.render)?;
        if markup.len() > MAX_OUTPUT_SIZE {
            let error = PipelineError::OutputTooLarge { size: markup.len() };
            log_error!(error.error_code(), "Rendered output exceeds limit",
                "language" => env.language,
                "size" => markup.len(),
                "limit" => MAX_OUTPUT_SIZE
            );
            return Err(error);
        }

        Ok((markup, tokenizer.metrics().clone()))
    }

    fn tokenizer(&self) -> Tokenizer<'_> {
        Tokenizer::with_preferences(&self.registry, self.config.tokenizer.clone())
    }

    fn resolve(&self, language: &str) -> Result<GrammarId, PipelineError> {
        self.registry
            .resolve(language)
            .ok_or_else(|| PipelineError::UnknownLanguage(language.to_string()))
    }

    fn encode_plain(&self, code: &str) -> String {
        if self.config.render.encode_entities {
            encode_text(code)
        } else {
            code.to_string()
        }
    }

    fn run_stage(&self, stage: HighlightStage, env: &mut HighlightEnv) -> Result<(), PipelineError> {
        Ok(self.hooks.run_highlight(stage, env)?)
    }

    fn finish(
        &self,
        env: HighlightEnv,
        tokenized: bool,
        metrics: Option<TokenizeMetrics>,
        start_time: Instant,
    ) -> HighlightResult {
        let result = HighlightResult {
            language: env.language,
            markup: env.highlighted.unwrap_or_default(),
            tokenized,
            metrics,
            duration: start_time.elapsed(),
        };
        result.log_success();
        result
    }
}
