// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as positive batch sizes and worker counts.

use crate::diagnostic::ConfigError;
use crate::model::TagwiseConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &TagwiseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        invalid(format!(
            "log.level `{}` must be one of {}",
            config.log.level,
            LOG_LEVELS.join(", ")
        ));
    }

    let pipeline = &config.pipeline;
    if pipeline.batch_size < 1 {
        invalid("pipeline.batch_size must be at least 1".to_string());
    }
    if pipeline.max_workers < 1 {
        invalid("pipeline.max_workers must be at least 1".to_string());
    }
    if pipeline.max_item_text_length == Some(0) {
        invalid("pipeline.max_item_text_length must be at least 1".to_string());
    }

    let anthropic = &config.anthropic;
    if anthropic.default_model.trim().is_empty() {
        invalid("anthropic.default_model must not be empty".to_string());
    }
    if anthropic.api_version.trim().is_empty() {
        invalid("anthropic.api_version must not be empty".to_string());
    }
    if anthropic.max_tokens < 1 {
        invalid("anthropic.max_tokens must be at least 1".to_string());
    }
    if anthropic.request_timeout_secs < 1 {
        invalid("anthropic.request_timeout_secs must be at least 1".to_string());
    }
    if !(anthropic.base_url.starts_with("https://") || anthropic.base_url.starts_with("http://"))
    {
        invalid(format!(
            "anthropic.base_url `{}` must be an http(s) URL",
            anthropic.base_url
        ));
    }

    if config.input.comment_column.trim().is_empty() {
        invalid("input.comment_column must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
