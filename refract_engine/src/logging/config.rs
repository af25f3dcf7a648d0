//! Logging configuration: compile-time buffer limits plus runtime preferences

use crate::config::compile_time::logging::*;
use crate::config::runtime::LoggingPreferences;
use crate::logging::events::LogLevel;
use std::sync::OnceLock;

// ============================================================================
// RUNTIME PREFERENCES STORAGE
// ============================================================================

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Initialize runtime preferences
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    RUNTIME_PREFERENCES
        .set(preferences)
        .map_err(|_| "Runtime preferences already initialized".to_string())
}

/// Get runtime preferences (with fallback to defaults)
fn get_runtime_preferences() -> LoggingPreferences {
    RUNTIME_PREFERENCES.get().cloned().unwrap_or_default()
}

// ============================================================================
// CONFIGURATION ACCESS FUNCTIONS
// ============================================================================

pub fn get_min_log_level() -> LogLevel {
    get_runtime_preferences().min_log_level
}

pub fn use_structured_logging() -> bool {
    get_runtime_preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    get_runtime_preferences().enable_console_logging
}

/// Maximum events kept by in-memory loggers
pub fn get_log_buffer_size() -> usize {
    LOG_BUFFER_SIZE
}

/// Cut messages down to the compile-time length limit on a char boundary
pub fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_LOG_MESSAGE_LENGTH {
        return message.to_string();
    }

    let mut end = MAX_LOG_MESSAGE_LENGTH;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}

/// Human-readable configuration summary
pub fn get_config_summary() -> String {
    let preferences = get_runtime_preferences();
    format!(
        "=== Logging Configuration ===\n\
         Min level: {}\n\
         Structured: {}\n\
         Console: {}\n\
         Buffer size: {}\n\
         Max message length: {}\n",
        preferences.min_log_level.as_str(),
        preferences.use_structured_logging,
        preferences.enable_console_logging,
        LOG_BUFFER_SIZE,
        MAX_LOG_MESSAGE_LENGTH,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(truncate_message("tokenized"), "tokenized");
    }

    #[test]
    fn test_long_message_truncated_on_char_boundary() {
        let message = "é".repeat(MAX_LOG_MESSAGE_LENGTH);
        let truncated = truncate_message(&message);

        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= MAX_LOG_MESSAGE_LENGTH + 3);
    }

    #[test]
    fn test_summary_mentions_limits() {
        let summary = get_config_summary();
        assert!(summary.contains(&LOG_BUFFER_SIZE.to_string()));
    }
}
