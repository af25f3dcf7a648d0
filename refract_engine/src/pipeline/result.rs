use crate::lexical::TokenizeMetrics;
use crate::logging::codes;
use serde::Serialize;
use std::time::Duration;

/// Outcome of one block highlight
#[derive(Debug, Clone, Serialize)]
pub struct HighlightResult {
    pub language: String,
    /// Final markup, after `before-insert` handlers
    pub markup: String,
    /// Whether a grammar tokenized the code; plain-encoded otherwise
    pub tokenized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TokenizeMetrics>,
    #[serde(skip)]
    pub duration: Duration,
}

impl HighlightResult {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    pub fn log_success(&self) {
        crate::log_success!(
            codes::success::HIGHLIGHT_COMPLETE,
            "Block highlight completed",
            "language" => self.language,
            "tokenized" => self.tokenized,
            "markup_bytes" => self.markup.len(),
            "duration_ms" => format!("{:.2}", self.duration_ms())
        );
    }
}
