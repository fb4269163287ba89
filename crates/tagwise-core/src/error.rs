// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tagwise classification pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type for pipeline construction and collaborator I/O.
///
/// Per-batch remote failures never surface through this type during a run;
/// the dispatcher converts them into failed batch outcomes.
#[derive(Debug, Error)]
pub enum TagwiseError {
    /// Invalid batch, worker, cache, or provider configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A remote classifier call failed outside of a dispatched run.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// File system errors while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular input/output errors.
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single remote classification call.
///
/// Cloneable so a failed outcome can be recorded per batch and still be
/// logged by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service rejected the credentials (401/403).
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The service is throttling requests (429).
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// The request did not complete within the client timeout.
    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The service reported an internal or overload error (5xx, 529).
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status reported by the service.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {message}")]
    Malformed { message: String },

    /// The response decoded but carried no text.
    #[error("empty response")]
    EmptyResponse,

    /// Connection-level failure before a status was received.
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl RemoteError {
    /// Returns true for failures that may succeed when attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::RateLimited { .. }
                | RemoteError::Timeout { .. }
                | RemoteError::Server { .. }
                | RemoteError::Transport { .. }
        )
    }
}
