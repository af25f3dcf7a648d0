// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    tokenizer: TokenizerLimits,
    composition: CompositionLimits,
    render: RenderLimits,
    loader: LoaderLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct TokenizerLimits {
    max_input_size: usize,
    max_nesting_depth: usize,
}

#[derive(serde::Deserialize)]
struct CompositionLimits {
    max_traversal_nodes: usize,
}

#[derive(serde::Deserialize)]
struct RenderLimits {
    max_output_size: usize,
}

#[derive(serde::Deserialize)]
struct LoaderLimits {
    max_document_size: u64,
    max_languages: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=REFRACT_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=REFRACT_CONFIG_DIR");

    let profile = env::var("REFRACT_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("REFRACT_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Find workspace root (parent of refract_engine directory)
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_INPUT_SIZE: usize = 1_000_000_000;
    const ABSOLUTE_MAX_NESTING_DEPTH: usize = 4096;

    if config.tokenizer.max_input_size > ABSOLUTE_MAX_INPUT_SIZE {
        panic!("LIMITS: tokenizer.max_input_size exceeds absolute maximum");
    }

    if config.tokenizer.max_nesting_depth == 0
        || config.tokenizer.max_nesting_depth > ABSOLUTE_MAX_NESTING_DEPTH
    {
        panic!("LIMITS: tokenizer.max_nesting_depth must be in 1..={ABSOLUTE_MAX_NESTING_DEPTH}");
    }

    if config.composition.max_traversal_nodes == 0 {
        panic!("LIMITS: composition.max_traversal_nodes cannot be zero");
    }

    if config.logging.log_buffer_size < 100 {
        panic!("LIMITS: logging.log_buffer_size too small (min: 100)");
    }

    if profile == "production" && config.tokenizer.max_input_size > 50_000_000 {
        panic!("PRODUCTION: tokenizer.max_input_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod tokenizer {{
        pub const MAX_INPUT_SIZE: usize = {};
        pub const MAX_NESTING_DEPTH: usize = {};
    }}

    pub mod composition {{
        pub const MAX_TRAVERSAL_NODES: usize = {};
    }}

    pub mod render {{
        pub const MAX_OUTPUT_SIZE: usize = {};
    }}

    pub mod loader {{
        pub const MAX_DOCUMENT_SIZE: u64 = {};
        pub const MAX_LANGUAGES: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
    }}
}}
"#,
        profile,
        config.tokenizer.max_input_size,
        config.tokenizer.max_nesting_depth,
        config.composition.max_traversal_nodes,
        config.render.max_output_size,
        config.loader.max_document_size,
        config.loader.max_languages,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
    );

    fs::write(output_path, constants_code).unwrap();
}
