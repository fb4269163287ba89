// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic classifier adapter for the Tagwise pipeline.
//!
//! This crate implements [`RemoteClassifier`] on top of the Anthropic
//! Messages API: one non-streaming request per batch, raw text back.

pub mod client;
pub mod prompt;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tagwise_config::model::AnthropicConfig;
use tagwise_core::{Batch, ClassificationMode, RemoteClassifier, RemoteError, TagwiseError};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic-backed [`RemoteClassifier`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var -> error.
pub struct AnthropicClassifier {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicClassifier {
    /// Creates a classifier from the `[anthropic]` configuration section.
    pub fn new(config: &AnthropicConfig) -> Result<Self, TagwiseError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(model = %config.default_model, "Anthropic classifier initialized");

        Ok(Self::with_client(
            client,
            config.default_model.clone(),
            config.max_tokens,
        ))
    }

    /// Creates a classifier around an existing client.
    pub fn with_client(client: AnthropicClient, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    fn to_message_request(&self, batch: &Batch, mode: ClassificationMode) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: prompt::render_items(batch),
            }],
            system: Some(prompt::system_prompt(mode).to_string()),
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl RemoteClassifier for AnthropicClassifier {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn classify(
        &self,
        batch: &Batch,
        mode: ClassificationMode,
    ) -> Result<String, RemoteError> {
        let request = self.to_message_request(batch, mode);
        let response = self.client.complete_message(&request).await?;
        let text = response.text();

        debug!(
            batch = batch.index(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
            "batch classified"
        );

        if text.trim().is_empty() {
            return Err(RemoteError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, TagwiseError> {
    if let Some(key) = config_key.as_ref().filter(|k| !k.trim().is_empty()) {
        return Ok(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            TagwiseError::Config(
                "Anthropic API key not found. Set anthropic.api_key in config or ANTHROPIC_API_KEY environment variable.".into(),
            )
        })
}
