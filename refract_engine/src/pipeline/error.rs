use crate::config::compile_time::render::MAX_OUTPUT_SIZE;
use crate::config::ConfigError;
use crate::grammar::{CompositionError, GrammarError, LoaderError};
use crate::hooks::HookError;
use crate::lexical::LexerError;
use crate::logging::codes;

/// Highlight pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Tokenization failed: {0}")]
    Lexical(#[from] LexerError),

    #[error("Grammar composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("Hook failed: {0}")]
    Hook(#[from] HookError),

    #[error("Grammar document error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("The language \"{0}\" has no grammar")]
    UnknownLanguage(String),

    #[error("Rendered output is {size} bytes (max {MAX_OUTPUT_SIZE})")]
    OutputTooLarge { size: usize },

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::Grammar(error) => error.error_code(),
            Self::Lexical(error) => error.error_code(),
            Self::Composition(error) => error.error_code(),
            Self::Hook(error) => error.error_code(),
            Self::Loader(error) => error.error_code(),
            Self::Config(_) => codes::system::CONFIGURATION_ERROR,
            Self::UnknownLanguage(_) => codes::grammar::UNKNOWN_LANGUAGE,
            Self::OutputTooLarge { .. } => codes::render::OUTPUT_TOO_LARGE,
            Self::Pipeline { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}
