// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote classifier trait for text-completion services.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{Batch, ClassificationMode};

/// Classifies one batch with a single outbound request.
///
/// Implementations render the prompt for `mode`, issue exactly one call, and
/// return the raw response text. They must not retry: retry and backoff are
/// owned by the dispatcher.
#[async_trait]
pub trait RemoteClassifier: Send + Sync + 'static {
    /// Short identifier used in logs, e.g. `"anthropic"`.
    fn name(&self) -> &str;

    async fn classify(&self, batch: &Batch, mode: ClassificationMode)
    -> Result<String, RemoteError>;
}
