// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tagwise - batch tagging of free-text comments.
//!
//! This is the binary entry point for the Tagwise CLI.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod classify;
mod input;
mod output;
mod shutdown;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tagwise_config::{ConfigError, TagwiseConfig};

use crate::classify::ClassifyArgs;

/// Tagwise - batch tagging of free-text comments.
#[derive(Parser, Debug)]
#[command(name = "tagwise", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the comments of a CSV file.
    ///
    /// Identical batches within one run are answered from an in-memory
    /// cache; nothing is cached between runs.
    Classify(ClassifyArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            tagwise_config::render_errors(&errors);
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Config => match render_config(&config) {
            Ok(text) => {
                print!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("tagwise: failed to render configuration: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Classify(args) => {
            let config = match args.apply(config) {
                Ok(config) => config,
                Err(errors) => {
                    tagwise_config::render_errors(&errors);
                    return ExitCode::from(2);
                }
            };
            init_tracing(&config.log.level);
            tagwise_pipeline::recording::register_metrics();

            match classify::run_classify(&config, &args).await {
                Ok(summary) => {
                    eprintln!("tagwise: {}", classify::format_summary(&summary));
                    if summary.cancelled {
                        ExitCode::from(130)
                    } else {
                        ExitCode::SUCCESS
                    }
                }
                Err(e) => {
                    eprintln!("tagwise: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TagwiseConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tagwise_config::load_and_validate_path(path),
        None => tagwise_config::load_and_validate(),
    }
}

/// Effective configuration as TOML with the API key masked.
fn render_config(config: &TagwiseConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.anthropic.api_key.is_some() {
        shown.anthropic.api_key = Some("<redacted>".to_string());
    }
    toml::to_string_pretty(&shown)
}

/// Initialize tracing subscriber with log level from config.
///
/// Logs go to stderr so CSV written to stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tagwise={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn classify_help_scopes_the_cache_to_one_run() {
        let cli = Cli::command();
        let classify = cli.find_subcommand("classify").unwrap();
        let help = classify.get_long_about().unwrap().to_string();
        assert!(help.contains("nothing is cached between runs"), "{help}");
    }

    #[test]
    fn classify_flags_parse() {
        let cli = Cli::try_parse_from([
            "tagwise",
            "classify",
            "--input",
            "comments.csv",
            "--mode",
            "tags-sentiment",
            "--batch-size",
            "10",
            "--workers",
            "2",
            "--keep-duplicates",
        ])
        .unwrap();
        let Commands::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.input, PathBuf::from("comments.csv"));
        assert_eq!(args.mode, Some(tagwise_core::ClassificationMode::TagsSentiment));
        assert_eq!(args.batch_size, Some(10));
        assert_eq!(args.workers, Some(2));
        assert!(args.keep_duplicates);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let result =
            Cli::try_parse_from(["tagwise", "classify", "--input", "x.csv", "--mode", "emoji"]);
        assert!(result.is_err());
    }

    #[test]
    fn rendered_config_round_trips_and_hides_key() {
        let mut config = TagwiseConfig::default();
        config.anthropic.api_key = Some("sk-ant-secret".into());

        let text = render_config(&config).unwrap();
        assert!(!text.contains("sk-ant-secret"));
        assert!(text.contains("[pipeline]"));

        let reparsed = tagwise_config::load_and_validate_str(&text).unwrap();
        assert_eq!(reparsed.pipeline.batch_size, config.pipeline.batch_size);
        assert_eq!(reparsed.input.comment_column, "コメント");
    }
}
