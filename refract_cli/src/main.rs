//! # Refract CLI
//!
//! Loads grammar documents, then highlights a file, dumps its token tree, or
//! lists the registered languages.

use clap::{Parser, Subcommand};
use refract_engine::config::RuntimeConfig;
use refract_engine::hooks::builtin;
use refract_engine::logging::{self, LogCrateLogger, LogLevel, LoggingService};
use refract_engine::{log_info, Highlighter};
use serde::Serialize;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "refract", version, about = "Grammar-driven syntax highlighter")]
struct Cli {
    /// Grammar document (.toml or .json); repeat to load several, in order
    #[arg(short, long = "grammar", global = true, value_name = "DOC")]
    grammars: Vec<PathBuf>,

    /// Runtime preferences file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a file as highlighted markup
    Highlight {
        file: PathBuf,

        #[arg(short, long)]
        language: String,

        /// Print the markup and metrics as JSON
        #[arg(long)]
        json: bool,

        /// Install the bundled keyword-class and entity-title handlers
        #[arg(long)]
        builtin_hooks: bool,
    },

    /// Print the token tree of a file as JSON
    Tokens {
        file: PathBuf,

        #[arg(short, long)]
        language: String,
    },

    /// List registered language names
    Languages {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct LanguageEntry<'a> {
    name: &'a str,
    grammar: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {}", error);
            return ExitCode::from(1);
        }
    };
    init_logging(&config);

    let stdout = io::stdout();
    match run(cli, config, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::from(1)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    })
}

/// Route engine events through `env_logger`
fn init_logging(config: &RuntimeConfig) {
    if let Err(error) =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).try_init()
    {
        eprintln!("warning: {}", error);
    }

    let min_level = match log::max_level() {
        log::LevelFilter::Trace | log::LevelFilter::Debug => LogLevel::Debug,
        log::LevelFilter::Info => LogLevel::Info,
        log::LevelFilter::Warn => LogLevel::Warning,
        log::LevelFilter::Error | log::LevelFilter::Off => LogLevel::Error,
    };
    let min_level = min_level.min(config.logging.min_log_level);

    if let Err(error) = logging::config::init_runtime_preferences(config.logging.clone()) {
        eprintln!("warning: {}", error);
    }
    let service = LoggingService::new(Arc::new(LogCrateLogger), min_level);
    if let Err(error) = logging::init_global_logging_with_service(Arc::new(service)) {
        eprintln!("warning: {}", error);
    }
}

fn run(cli: Cli, config: RuntimeConfig, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let mut highlighter = Highlighter::with_config(config);
    for document in &cli.grammars {
        let summary = highlighter.load_grammar_document(document)?;
        log_info!("Grammar document loaded",
            "path" => document.display(),
            "languages" => summary.languages.join(",")
        );
    }

    match cli.command {
        Command::Highlight {
            file,
            language,
            json,
            builtin_hooks,
        } => {
            if builtin_hooks {
                builtin::install(highlighter.hooks_mut());
            }
            let code = read_source(&file)?;
            let result = highlighter.highlight_block(&code, &language)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            } else {
                writeln!(out, "{}", result.markup)?;
            }
        }
        Command::Tokens { file, language } => {
            let code = read_source(&file)?;
            let tokens = highlighter.tokenize_language(&code, &language)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&tokens)?)?;
        }
        Command::Languages { json } => {
            let entries: Vec<LanguageEntry<'_>> = highlighter
                .registry()
                .languages()
                .map(|(name, id)| LanguageEntry {
                    name,
                    grammar: id.index(),
                })
                .collect();
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            } else {
                for entry in &entries {
                    writeln!(out, "{}\t#{}", entry.name, entry.grammar)?;
                }
            }
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String, Box<dyn Error>> {
    std::fs::read_to_string(path)
        .map_err(|error| format!("cannot read {}: {}", path.display(), error).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::TempDir;

    const GRAMMAR: &str = r#"
[[language]]
name = "calc"
aliases = ["calculator"]

[[language.token]]
name = "number"
pattern = '\d+'

[[language.token]]
name = "keyword"
pattern = '\b(?:let)\b'
"#;

    fn fixture() -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let grammar = dir.path().join("calc.toml");
        let source = dir.path().join("input.calc");
        fs::write(&grammar, GRAMMAR).unwrap();
        fs::write(&source, "let x = 1 < 2").unwrap();
        (dir, grammar, source)
    }

    fn run_args(args: &[&str]) -> Result<String, Box<dyn Error>> {
        let cli = Cli::try_parse_from(args)?;
        let mut out = Vec::new();
        run(cli, RuntimeConfig::default(), &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "refract", "highlight", "a.js", "--language", "js", "-g", "one.toml", "--grammar",
            "two.json",
        ])
        .unwrap();

        assert_eq!(cli.grammars, vec![PathBuf::from("one.toml"), PathBuf::from("two.json")]);
        assert_matches!(cli.command, Command::Highlight { ref language, json: false, .. } if language == "js");

        assert!(Cli::try_parse_from(["refract", "tokens", "a.js"]).is_err());
    }

    #[test]
    fn test_highlight_command() {
        let (_dir, grammar, source) = fixture();
        let output = run_args(&[
            "refract",
            "highlight",
            source.to_str().unwrap(),
            "-l",
            "calculator",
            "-g",
            grammar.to_str().unwrap(),
            "--builtin-hooks",
        ])
        .unwrap();

        assert_eq!(
            output.trim_end(),
            "<span class=\"token keyword keyword-let\">let</span> x = \
             <span class=\"token number\">1</span> &lt; <span class=\"token number\">2</span>"
        );
    }

    #[test]
    fn test_highlight_json_and_tokens() {
        let (_dir, grammar, source) = fixture();
        let grammar = grammar.to_str().unwrap();
        let source = source.to_str().unwrap();

        let json = run_args(&["refract", "highlight", source, "-l", "calc", "--json", "-g", grammar])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["language"], "calc");
        assert_eq!(value["tokenized"], true);

        let tokens = run_args(&["refract", "tokens", source, "-l", "calc", "-g", grammar]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&tokens).unwrap();
        assert_eq!(value[0]["type"], "keyword");
        assert_eq!(value[0]["content"], "let");
        assert_eq!(value[1], " x = ");
    }

    #[test]
    fn test_languages_command() {
        let (_dir, grammar, _) = fixture();
        let output =
            run_args(&["refract", "languages", "-g", grammar.to_str().unwrap()]).unwrap();

        assert!(output.lines().any(|line| line.starts_with("calc\t")));
        assert!(output.lines().any(|line| line.starts_with("calculator\t")));
        assert!(output.lines().any(|line| line.starts_with("plain\t")));
    }

    #[test]
    fn test_repeated_logging_init_only_warns() {
        let config = RuntimeConfig::default();
        init_logging(&config);
        init_logging(&config);
        assert!(logging::config::init_runtime_preferences(config.logging.clone()).is_err());
    }

    #[test]
    fn test_errors_surface() {
        let (dir, grammar, _) = fixture();
        let missing = dir.path().join("missing.calc");

        let err = run_args(&[
            "refract",
            "tokens",
            missing.to_str().unwrap(),
            "-l",
            "calc",
            "-g",
            grammar.to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("cannot read"));

        let source = dir.path().join("input.calc");
        let err = run_args(&["refract", "tokens", source.to_str().unwrap(), "-l", "cobol"]).unwrap_err();
        assert!(err.to_string().contains("cobol"));
    }
}
