//! Configuration module for the Refract engine
//! Compile-time limits come from the TOML profile selected at build time;
//! runtime preferences live in [`runtime`].

// Include generated constants from build.rs
// This file is generated at compile time from config/<profile>.toml
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{
    ConfigError, GreedyOverlap, LoggingPreferences, RenderPreferences, RuntimeConfig,
    TokenizerPreferences,
};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("REFRACT_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("REFRACT_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time::*;

    #[test]
    fn test_generated_limits_are_usable() {
        assert!(tokenizer::MAX_INPUT_SIZE > 0);
        assert!(tokenizer::MAX_NESTING_DEPTH > 0);
        assert!(composition::MAX_TRAVERSAL_NODES > 0);
        assert!(render::MAX_OUTPUT_SIZE >= tokenizer::MAX_INPUT_SIZE);
        assert!(loader::MAX_LANGUAGES > 0);
        assert!(logging::LOG_BUFFER_SIZE >= 100);
    }

    #[test]
    fn test_source_info_names_profile() {
        let info = super::build_info::source_info();
        assert!(info.contains(super::build_info::profile()));
        assert!(info.ends_with(".toml"));
    }
}
