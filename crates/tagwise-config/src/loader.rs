// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tagwise.toml` > `~/.config/tagwise/tagwise.toml` > `/etc/tagwise/tagwise.toml`
//! with environment variable overrides via `TAGWISE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TagwiseConfig;

/// Top-level sections addressable through `TAGWISE_<SECTION>_<KEY>` variables.
const SECTIONS: &[&str] = &["log", "pipeline", "cache", "anthropic", "input"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tagwise/tagwise.toml` (system-wide)
/// 3. `~/.config/tagwise/tagwise.toml` (user XDG config)
/// 4. `./tagwise.toml` (local directory)
/// 5. `TAGWISE_*` environment variables
pub fn load_config() -> Result<TagwiseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TagwiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TagwiseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TagwiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TagwiseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TagwiseConfig::default()))
        .merge(Toml::file("/etc/tagwise/tagwise.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tagwise/tagwise.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tagwise.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section mapping.
///
/// Only the leading section name is turned into a dot, so
/// `TAGWISE_PIPELINE_MAX_WORKERS` maps to `pipeline.max_workers` rather than
/// `pipeline.max.workers`.
fn env_provider() -> Env {
    Env::prefixed("TAGWISE_").map(|key| {
        let key_str = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key_str
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key_str.to_string().into()
    })
}
