// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tagwise configuration system.

use tagwise_config::diagnostic::ConfigError;
use tagwise_config::{load_and_validate_str, load_config_from_str};
use tagwise_core::ClassificationMode;

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tagwise_config() {
    let toml = r#"
[log]
level = "debug"

[pipeline]
batch_size = 25
max_workers = 8
max_item_text_length = 300
mode = "tags-sentiment"
max_retries = 2
retry_backoff_ms = 250

[cache]
ttl_secs = 120

[anthropic]
api_key = "sk-ant-123"
default_model = "claude-sonnet-4-20250514"
max_tokens = 4096
request_timeout_secs = 30

[input]
comment_column = "comment"
date_column = "created_at"
drop_duplicates = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.pipeline.batch_size, 25);
    assert_eq!(config.pipeline.max_workers, 8);
    assert_eq!(config.pipeline.max_item_text_length, Some(300));
    assert_eq!(config.pipeline.mode, ClassificationMode::TagsSentiment);
    assert_eq!(config.pipeline.max_retries, 2);
    assert_eq!(config.pipeline.retry_backoff_ms, 250);
    assert_eq!(config.cache.ttl_secs, 120);
    assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-123"));
    assert_eq!(config.anthropic.default_model, "claude-sonnet-4-20250514");
    assert_eq!(config.anthropic.max_tokens, 4096);
    assert_eq!(config.anthropic.request_timeout_secs, 30);
    assert_eq!(config.input.comment_column, "comment");
    assert_eq!(config.input.date_column, "created_at");
    assert!(!config.input.drop_duplicates);
}

/// An empty document yields the compiled defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.pipeline.batch_size, 20);
    assert_eq!(config.pipeline.max_workers, 4);
    assert_eq!(config.cache.ttl_secs, 3600);
    assert_eq!(config.pipeline.max_item_text_length, None);
}

/// A typo in [pipeline] yields an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_pipeline_key_suggests_correction() {
    let toml = r#"
[pipeline]
batch_sise = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should contain an UnknownKey error");
    assert_eq!(unknown.0, "batch_sise");
    assert_eq!(unknown.1.as_deref(), Some("batch_size"));
}

/// An unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value types produce an InvalidType diagnostic naming the key path.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[pipeline]
max_workers = "four"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string worker count");
    assert!(
        errors.iter().any(|e| matches!(
            e,
            ConfigError::InvalidType { key, .. } if key.contains("max_workers")
        )),
        "got: {errors:?}"
    );
}

/// An unknown classification mode is rejected at load time.
#[test]
fn unknown_mode_is_rejected() {
    let toml = r#"
[pipeline]
mode = "sentiment-only"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

/// Semantic validation runs after a successful load.
#[test]
fn zero_batch_size_fails_semantic_validation() {
    let toml = r#"
[pipeline]
batch_size = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("batch_size 0 is invalid");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("batch_size"))
    ));
}
