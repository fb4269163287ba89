// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tagwise pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use tagwise_core::ClassificationMode;

/// Top-level Tagwise configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TagwiseConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Batching, concurrency and parsing settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// CSV input settings used by the command-line front end.
    #[serde(default)]
    pub input: InputConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Batching and dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Number of items sent per remote request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of batches in flight at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-item character budget. `None` uses the mode default (200 or 500).
    #[serde(default)]
    pub max_item_text_length: Option<usize>,

    /// What the remote model is asked to produce.
    #[serde(default)]
    pub mode: ClassificationMode,

    /// Extra attempts for transient remote failures. 0 disables retries.
    #[serde(default)]
    pub max_retries: u32,

    /// Base delay between attempts, multiplied by the attempt number.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_workers: default_max_workers(),
            max_item_text_length: None,
            mode: ClassificationMode::default(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_batch_size() -> usize {
    20
}

fn default_max_workers() -> usize {
    4
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Entry lifetime in seconds. 0 disables caching.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires the `ANTHROPIC_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for classification requests.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per batch response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Messages endpoint. Overridable for proxies and tests.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-haiku-4-5-20251001".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_base_url() -> String {
    "https://api.anthropic.com/v1/messages".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// CSV input configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Header of the column holding the free-text comments.
    #[serde(default = "default_comment_column")]
    pub comment_column: String,

    /// Header of the creation-date column.
    ///
    /// When the file has this column, rows with a blank date are dropped and
    /// duplicates are judged on (comment, date). Empty disables it.
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Drop rows that repeat an earlier row's comment (and date).
    #[serde(default = "default_drop_duplicates")]
    pub drop_duplicates: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            comment_column: default_comment_column(),
            date_column: default_date_column(),
            drop_duplicates: default_drop_duplicates(),
        }
    }
}

fn default_comment_column() -> String {
    "コメント".to_string()
}

fn default_date_column() -> String {
    "作成日".to_string()
}

fn default_drop_duplicates() -> bool {
    true
}
