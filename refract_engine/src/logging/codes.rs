//! Error and success codes with their classification metadata
//!
//! Single source of truth for every code the engine logs or attaches to an error.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_ERROR: Code = Code::new("ERR003");
}

/// Grammar model error codes
pub mod grammar {
    use super::Code;

    pub const UNKNOWN_LANGUAGE: Code = Code::new("E010");
    pub const INVALID_PATTERN: Code = Code::new("E011");
    pub const LOOKBEHIND_WITHOUT_GROUP: Code = Code::new("E012");
    pub const UNKNOWN_GRAMMAR: Code = Code::new("E013");
}

/// Tokenizer error codes
pub mod tokenizer {
    use super::Code;

    pub const PATHOLOGICAL_GROWTH: Code = Code::new("E020");
    pub const INPUT_TOO_LARGE: Code = Code::new("E021");
    pub const NESTING_TOO_DEEP: Code = Code::new("E022");
    pub const UNKNOWN_GRAMMAR: Code = Code::new("E023");
    pub const EMPTY_MATCH: Code = Code::new("E024");
}

/// Grammar composition codes
pub mod composition {
    use super::Code;

    pub const UNKNOWN_CONTAINER: Code = Code::new("E030");
    pub const UNKNOWN_BASE: Code = Code::new("E031");
    pub const TRAVERSAL_LIMIT_EXCEEDED: Code = Code::new("E032");

    // Best-effort edits
    pub const ANCHOR_NOT_FOUND: Code = Code::new("W030");
}

/// Serializer error codes
pub mod render {
    use super::Code;

    pub const OUTPUT_TOO_LARGE: Code = Code::new("E040");
}

/// Hook bus error codes
pub mod hooks {
    use super::Code;

    pub const HANDLER_FAILED: Code = Code::new("E050");
}

/// Grammar document loader error codes
pub mod loader {
    use super::Code;

    pub const IO_ERROR: Code = Code::new("E060");
    pub const DOCUMENT_TOO_LARGE: Code = Code::new("E061");
    pub const PARSE_ERROR: Code = Code::new("E062");
    pub const UNRESOLVED_REFERENCE: Code = Code::new("E063");
    pub const INVALID_RULE: Code = Code::new("E064");
    pub const TOO_MANY_LANGUAGES: Code = Code::new("E065");
    pub const UNSUPPORTED_FORMAT: Code = Code::new("E066");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const COMPOSITION_APPLIED: Code = Code::new("I030");
    pub const RENDER_COMPLETE: Code = Code::new("I040");
    pub const GRAMMAR_DOCUMENT_LOADED: Code = Code::new("I060");
    pub const HIGHLIGHT_COMPLETE: Code = Code::new("I070");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn register(registry: &mut HashMap<&'static str, ErrorMetadata>, metadata: ErrorMetadata) {
    registry.insert(metadata.code, metadata);
}

/// Initialize and get the error registry
fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut registry = HashMap::new();

        // System errors
        register(
            &mut registry,
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal engine error",
                "File a bug report with the grammar and input that triggered it",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or engine initialization failed",
                "Initialize the engine once per process",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "ERR003",
                "System",
                Severity::High,
                true,
                false,
                "Runtime configuration could not be read",
                "Check the runtime configuration file and REFRACT_* variables",
            ),
        );

        // Grammar errors
        register(
            &mut registry,
            ErrorMetadata::new(
                "E010",
                "Grammar",
                Severity::High,
                true,
                false,
                "Requested language has no registered grammar",
                "Register or load a grammar for the language before highlighting",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E011",
                "Grammar",
                Severity::High,
                true,
                false,
                "Rule pattern failed to compile",
                "Fix the regular expression; lookaround and backreferences are unsupported",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E012",
                "Grammar",
                Severity::High,
                true,
                false,
                "Lookbehind rule has no capture group for its prefix",
                "Wrap the context prefix in the first capture group",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E013",
                "Grammar",
                Severity::Critical,
                false,
                true,
                "Grammar id does not belong to this registry",
                "Only use grammar ids issued by the registry being queried",
            ),
        );

        // Tokenizer errors
        register(
            &mut registry,
            ErrorMetadata::new(
                "E020",
                "Tokenizer",
                Severity::Critical,
                false,
                true,
                "Token stream grew beyond the input length",
                "Find the rule that matches empty text and make it consume at least one character",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E021",
                "Tokenizer",
                Severity::High,
                true,
                false,
                "Input exceeds the configured maximum size",
                "Split the input or rebuild with a larger tokenizer.max_input_size",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E022",
                "Tokenizer",
                Severity::High,
                false,
                true,
                "Nested grammar recursion exceeded the configured depth",
                "Check for rules whose inside grammar matches its own content again",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E023",
                "Tokenizer",
                Severity::Critical,
                false,
                true,
                "Tokenizer was handed a grammar id it cannot resolve",
                "Resolve the grammar through the registry before tokenizing",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E024",
                "Tokenizer",
                Severity::Critical,
                false,
                true,
                "A rule matched empty text",
                "Make the rule's pattern consume at least one character",
            ),
        );

        // Composition
        register(
            &mut registry,
            ErrorMetadata::new(
                "E030",
                "Composition",
                Severity::High,
                true,
                false,
                "Insert-before container is not bound in the composition root",
                "Check the container name against the registered languages",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E031",
                "Composition",
                Severity::High,
                true,
                false,
                "Base language for extend is not registered",
                "Load the base grammar before the grammars that extend it",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E032",
                "Composition",
                Severity::High,
                false,
                true,
                "Grammar graph traversal visited too many grammars",
                "Rebuild with a larger composition.max_traversal_nodes",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "W030",
                "Composition",
                Severity::Low,
                true,
                false,
                "Insert-before anchor not found; new entries were appended",
                "Check the anchor name if a specific position was intended",
            ),
        );

        // Render
        register(
            &mut registry,
            ErrorMetadata::new(
                "E040",
                "Render",
                Severity::High,
                true,
                false,
                "Rendered markup exceeds the configured maximum size",
                "Highlight smaller blocks or rebuild with a larger render.max_output_size",
            ),
        );

        // Hooks
        register(
            &mut registry,
            ErrorMetadata::new(
                "E050",
                "Hooks",
                Severity::Medium,
                true,
                false,
                "A hook handler reported an error",
                "Inspect the handler named in the error",
            ),
        );

        // Loader
        register(
            &mut registry,
            ErrorMetadata::new(
                "E060",
                "Loader",
                Severity::High,
                true,
                false,
                "Grammar document could not be read",
                "Check that the path exists and is readable",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E061",
                "Loader",
                Severity::High,
                true,
                false,
                "Grammar document exceeds the configured maximum size",
                "Split the document or rebuild with a larger loader.max_document_size",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E062",
                "Loader",
                Severity::High,
                true,
                false,
                "Grammar document is not valid TOML or JSON",
                "Fix the syntax error reported by the parser",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E063",
                "Loader",
                Severity::High,
                true,
                false,
                "Grammar document references an unknown language",
                "Declare referenced languages earlier in the document or in a prior document",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E064",
                "Loader",
                Severity::High,
                true,
                false,
                "Token entry has no usable rule",
                "Give every token either a pattern or a non-empty rules list",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E065",
                "Loader",
                Severity::High,
                true,
                false,
                "Registry holds the maximum number of languages",
                "Rebuild with a larger loader.max_languages",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "E066",
                "Loader",
                Severity::Medium,
                true,
                false,
                "Grammar document has an unsupported extension",
                "Use a .toml or .json document",
            ),
        );

        // Success codes
        register(
            &mut registry,
            ErrorMetadata::new(
                "I001",
                "System",
                Severity::Low,
                true,
                false,
                "Logging system initialized",
                "Continue",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "I020",
                "Tokenizer",
                Severity::Low,
                true,
                false,
                "Tokenization completed",
                "Continue to rendering",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "I030",
                "Composition",
                Severity::Low,
                true,
                false,
                "Grammar composition applied",
                "Continue",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "I040",
                "Render",
                Severity::Low,
                true,
                false,
                "Markup rendered",
                "Continue",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "I060",
                "Loader",
                Severity::Low,
                true,
                false,
                "Grammar document loaded",
                "Continue",
            ),
        );
        register(
            &mut registry,
            ErrorMetadata::new(
                "I070",
                "Pipeline",
                Severity::Low,
                true,
                false,
                "Highlight completed",
                "Continue",
            ),
        );

        registry
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_CODES: &[Code] = &[
        system::INTERNAL_ERROR,
        system::INITIALIZATION_FAILURE,
        system::CONFIGURATION_ERROR,
        grammar::UNKNOWN_LANGUAGE,
        grammar::INVALID_PATTERN,
        grammar::LOOKBEHIND_WITHOUT_GROUP,
        grammar::UNKNOWN_GRAMMAR,
        tokenizer::PATHOLOGICAL_GROWTH,
        tokenizer::INPUT_TOO_LARGE,
        tokenizer::NESTING_TOO_DEEP,
        tokenizer::UNKNOWN_GRAMMAR,
        tokenizer::EMPTY_MATCH,
        composition::UNKNOWN_CONTAINER,
        composition::UNKNOWN_BASE,
        composition::TRAVERSAL_LIMIT_EXCEEDED,
        composition::ANCHOR_NOT_FOUND,
        render::OUTPUT_TOO_LARGE,
        hooks::HANDLER_FAILED,
        loader::IO_ERROR,
        loader::DOCUMENT_TOO_LARGE,
        loader::PARSE_ERROR,
        loader::UNRESOLVED_REFERENCE,
        loader::INVALID_RULE,
        loader::TOO_MANY_LANGUAGES,
        loader::UNSUPPORTED_FORMAT,
        success::SYSTEM_INITIALIZATION_COMPLETED,
        success::TOKENIZATION_COMPLETE,
        success::COMPOSITION_APPLIED,
        success::RENDER_COMPLETE,
        success::GRAMMAR_DOCUMENT_LOADED,
        success::HIGHLIGHT_COMPLETE,
    ];

    #[test]
    fn test_every_code_has_metadata() {
        for code in ALL_CODES {
            let metadata = get_error_metadata(code.as_str());
            assert!(metadata.is_some(), "missing metadata for {}", code);
            assert_eq!(metadata.unwrap().code, code.as_str());
        }
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_category("X999"), "Unknown");
        assert_eq!(get_description("X999"), "Unknown error");
        assert_eq!(get_severity("X999"), Severity::Medium);
        assert!(is_recoverable("X999"));
        assert!(!requires_halt("X999"));
    }

    #[test]
    fn test_growth_guard_halts() {
        let code = tokenizer::PATHOLOGICAL_GROWTH.as_str();
        assert_eq!(get_severity(code), Severity::Critical);
        assert!(requires_halt(code));
        assert!(!is_recoverable(code));
    }
}
