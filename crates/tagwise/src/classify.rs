// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tagwise classify` command implementation.
//!
//! Reads comments from a CSV file, classifies them through the pipeline and
//! writes the rows back out with tag and sentiment columns appended.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tagwise_anthropic::AnthropicClassifier;
use tagwise_config::{ConfigError, TagwiseConfig};
use tagwise_core::{ClassificationMode, RemoteClassifier, TagwiseError};
use tagwise_pipeline::{Pipeline, PipelineSettings, RunSummary};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{input, output, shutdown};

/// Flags for `tagwise classify`; each overrides its configuration value.
#[derive(Args, Debug, Clone, Default)]
pub struct ClassifyArgs {
    /// CSV file with a comment column.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Where to write the result; stdout when omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name of the comment column.
    #[arg(long)]
    pub column: Option<String>,

    /// Name of the creation-date column; an empty value ignores dates.
    #[arg(long)]
    pub date_column: Option<String>,

    /// `tags-only` or `tags-sentiment`.
    #[arg(long)]
    pub mode: Option<ClassificationMode>,

    /// Comments per remote request.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Maximum concurrent remote requests.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Keep rows whose comment and date repeat an earlier row.
    #[arg(long)]
    pub keep_duplicates: bool,
}

impl ClassifyArgs {
    /// Applies the flags to `config` and re-validates the result.
    pub fn apply(&self, mut config: TagwiseConfig) -> Result<TagwiseConfig, Vec<ConfigError>> {
        if let Some(column) = &self.column {
            config.input.comment_column = column.clone();
        }
        if let Some(date_column) = &self.date_column {
            config.input.date_column = date_column.clone();
        }
        if let Some(mode) = self.mode {
            config.pipeline.mode = mode;
        }
        if let Some(batch_size) = self.batch_size {
            config.pipeline.batch_size = batch_size;
        }
        if let Some(workers) = self.workers {
            config.pipeline.max_workers = workers;
        }
        if self.keep_duplicates {
            config.input.drop_duplicates = false;
        }
        tagwise_config::validation::validate_config(&config)?;
        Ok(config)
    }
}

/// Run the `tagwise classify` command against the Anthropic API.
///
/// Ctrl+C cancels the run; finished batches are still written.
pub async fn run_classify(
    config: &TagwiseConfig,
    args: &ClassifyArgs,
) -> Result<RunSummary, TagwiseError> {
    let classifier = Arc::new(AnthropicClassifier::new(&config.anthropic)?);
    let cancel = shutdown::install_signal_handler();
    classify_file(
        config,
        classifier,
        &args.input,
        args.output.as_deref(),
        &cancel,
    )
    .await
}

/// Classifies the comments in `input` with `classifier`.
pub async fn classify_file(
    config: &TagwiseConfig,
    classifier: Arc<dyn RemoteClassifier>,
    input: &Path,
    output: Option<&Path>,
    cancel: &CancellationToken,
) -> Result<RunSummary, TagwiseError> {
    let table = input::read_comments(input, &config.input)?;
    info!(
        path = %input.display(),
        rows = table.len(),
        dropped_blank = table.dropped_blank(),
        dropped_duplicate = table.dropped_duplicate(),
        by_date = table.has_date_column(),
        "input loaded"
    );

    let pipeline = Pipeline::new(PipelineSettings::from_config(config), classifier)?;
    let run = pipeline
        .run_until_cancelled(&table.comments(), cancel)
        .await?;

    match output {
        Some(path) => output::write_results_to_path(path, &table, &run.records)?,
        None => output::write_results(std::io::stdout().lock(), &table, &run.records)?,
    }
    Ok(run.summary)
}

/// Human-readable run report for stderr.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "classified {} comments in {} batches",
        summary.total_items, summary.total_batches
    )];
    lines.push(format!(
        "  failed batches: {} ({:.1}%)",
        summary.failed_batches + summary.unfinished_batches,
        summary.failure_rate() * 100.0
    ));
    if summary.cache_hits > 0 {
        lines.push(format!("  cache hits: {}", summary.cache_hits));
    }
    if summary.degraded_lines + summary.padded_records > 0 {
        lines.push(format!(
            "  degraded lines: {}, padded records: {}",
            summary.degraded_lines, summary.padded_records
        ));
    }
    if summary.cancelled {
        lines.push(format!(
            "  cancelled: {} batches left unfinished",
            summary.unfinished_batches
        ));
    }
    lines.join("\n")
}
