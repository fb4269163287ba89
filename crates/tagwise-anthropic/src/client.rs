// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Anthropic Messages API.
//!
//! [`AnthropicClient`] issues exactly one request per call and maps every
//! failure onto a [`RemoteError`] variant. Retrying is left to the caller.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use tagwise_core::{RemoteError, TagwiseError};
use tracing::debug;

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

/// HTTP client for Anthropic API communication.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AnthropicClient {
    /// Creates a new Anthropic API client.
    ///
    /// # Arguments
    /// * `api_key` - Anthropic API key for authentication
    /// * `api_version` - API version string (e.g., "2023-06-01")
    /// * `base_url` - Messages endpoint URL
    /// * `timeout` - Whole-request timeout
    pub fn new(
        api_key: &str,
        api_version: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TagwiseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                TagwiseError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(api_version).map_err(|e| {
                TagwiseError::Config(format!("invalid API version header value: {e}"))
            })?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TagwiseError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Sends a non-streaming request and returns the decoded response.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, RemoteError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| RemoteError::Malformed {
            message: format!("failed to parse API response: {e}"),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout {
                duration: self.timeout,
            }
        } else {
            RemoteError::Transport {
                message: err.to_string(),
            }
        }
    }
}

/// Maps a non-success status and its body to the matching [`RemoteError`].
fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!("{}: {}", api_err.error.type_, api_err.error.message),
        Err(_) => body.to_string(),
    };
    let code = status.as_u16();

    match code {
        401 | 403 => RemoteError::Auth { message },
        429 => RemoteError::RateLimited { message },
        500..=599 => RemoteError::Server {
            status: code,
            message,
        },
        _ => RemoteError::Api {
            status: code,
            message,
        },
    }
}
