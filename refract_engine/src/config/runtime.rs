// RUNTIME PREFERENCES (User Experience)
//
// Hard limits are compile-time constants (see build.rs); everything here is a
// preference that may be set from the environment or a TOML file.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid runtime configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How a greedy match treats Tokens already claimed inside its span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreedyOverlap {
    /// Skip the match; claimed regions are never overlapped
    #[default]
    Skip,
    /// Displace the straddled Tokens and re-tokenize the displaced tail
    Absorb,
}

impl GreedyOverlap {
    pub fn as_str(&self) -> &'static str {
        match self {
            GreedyOverlap::Skip => "skip",
            GreedyOverlap::Absorb => "absorb",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "skip" => Some(GreedyOverlap::Skip),
            "absorb" => Some(GreedyOverlap::Absorb),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerPreferences {
    /// Greedy matches that straddle claimed Tokens
    pub greedy_overlap: GreedyOverlap,

    /// Whether to collect per-type token metrics
    pub collect_metrics: bool,

    /// Whether to emit a debug event for every claim
    pub log_claims: bool,
}

impl Default for TokenizerPreferences {
    fn default() -> Self {
        Self {
            greedy_overlap: env::var(env_vars::TOKENIZER_GREEDY_OVERLAP)
                .ok()
                .and_then(|v| GreedyOverlap::parse(&v))
                .unwrap_or_default(),
            collect_metrics: env::var(env_vars::TOKENIZER_COLLECT_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_claims: env::var(env_vars::TOKENIZER_LOG_CLAIMS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPreferences {
    /// Escape `&`, `<` and non-breaking spaces in text leaves before rendering
    pub encode_entities: bool,

    /// Add a `data-language` attribute to every rendered Token
    pub emit_language_attribute: bool,
}

impl Default for RenderPreferences {
    fn default() -> Self {
        Self {
            encode_entities: env::var(env_vars::RENDER_ENCODE_ENTITIES)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            emit_language_attribute: env::var(env_vars::RENDER_EMIT_LANGUAGE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level that reaches the logger
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
        }
    }
}

/// Parse log level from string (used for environment variables)
pub(crate) fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub tokenizer: TokenizerPreferences,
    pub render: RenderPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a runtime configuration document; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a runtime configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Tokenizer
    pub const TOKENIZER_GREEDY_OVERLAP: &str = "REFRACT_TOKENIZER_GREEDY_OVERLAP";
    pub const TOKENIZER_COLLECT_METRICS: &str = "REFRACT_TOKENIZER_COLLECT_METRICS";
    pub const TOKENIZER_LOG_CLAIMS: &str = "REFRACT_TOKENIZER_LOG_CLAIMS";

    // Render
    pub const RENDER_ENCODE_ENTITIES: &str = "REFRACT_RENDER_ENCODE_ENTITIES";
    pub const RENDER_EMIT_LANGUAGE: &str = "REFRACT_RENDER_EMIT_LANGUAGE";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "REFRACT_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "REFRACT_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "REFRACT_LOGGING_MIN_LEVEL";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("1"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_greedy_overlap_parsing() {
        assert_eq!(GreedyOverlap::parse("Absorb"), Some(GreedyOverlap::Absorb));
        assert_eq!(GreedyOverlap::parse("skip"), Some(GreedyOverlap::Skip));
        assert_eq!(GreedyOverlap::parse("merge"), None);
        assert_eq!(GreedyOverlap::default(), GreedyOverlap::Skip);
    }

    #[test]
    fn test_partial_toml_document() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [tokenizer]
            greedy_overlap = "absorb"
            log_claims = true

            [render]
            emit_language_attribute = true
            "#,
        )
        .unwrap();

        assert_eq!(config.tokenizer.greedy_overlap, GreedyOverlap::Absorb);
        assert!(config.tokenizer.log_claims);
        assert!(config.render.emit_language_attribute);
    }

    #[test]
    fn test_invalid_toml_document() {
        let result = RuntimeConfig::from_toml_str("[tokenizer]\ngreedy_overlap = \"sideways\"");
        assert_matches!(result, Err(ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refract.toml");
        fs::write(&path, "[logging]\nmin_log_level = \"Debug\"\n").unwrap();

        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);

        let missing = RuntimeConfig::load(dir.path().join("missing.toml"));
        assert_matches!(missing, Err(ConfigError::Io { .. }));
    }
}
