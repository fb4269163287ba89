// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the pipeline, the adapters, and the CLI.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{RemoteError, TagwiseError};

/// Maximum number of secondary tags a record can carry.
pub const MAX_SECONDARY_TAGS: usize = 2;

/// What the remote model is asked to produce for each item.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ClassificationMode {
    /// `<primary>|<secondary1>, <secondary2>`
    #[default]
    TagsOnly,
    /// `<tag1>, <tag2>, <tag3> | 感情: <label>`
    TagsSentiment,
}

impl ClassificationMode {
    /// Default per-item character budget when no override is configured.
    pub fn default_max_text_length(self) -> usize {
        match self {
            ClassificationMode::TagsOnly => 200,
            ClassificationMode::TagsSentiment => 500,
        }
    }
}

/// A single input text and its zero-based position in the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    pub position: usize,
    pub text: String,
}

/// A contiguous, non-empty slice of the input sent in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    index: usize,
    items: Vec<InputItem>,
}

impl Batch {
    /// Creates a batch, rejecting empty or non-contiguous item runs.
    pub fn new(index: usize, items: Vec<InputItem>) -> Result<Self, TagwiseError> {
        let Some(first) = items.first() else {
            return Err(TagwiseError::Internal(format!("batch {index} has no items")));
        };
        let start = first.position;
        if items
            .iter()
            .enumerate()
            .any(|(offset, item)| item.position != start + offset)
        {
            return Err(TagwiseError::Internal(format!(
                "batch {index} positions are not contiguous"
            )));
        }
        Ok(Self { index, items })
    }

    /// Ordinal of this batch within the run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Absolute position of the first item.
    pub fn start(&self) -> usize {
        self.items[0].position
    }

    /// Number of items; never zero.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Absolute position range owned by this batch.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start()..self.start() + self.len()
    }

    pub fn items(&self) -> &[InputItem] {
        &self.items
    }

    /// Normalized texts in order, the identity used for caching.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.text.as_str())
    }
}

/// Structured classification for one input item.
///
/// Every field may be absent; an all-absent record is the degraded result
/// for an item whose batch failed or whose response line was malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassificationRecord {
    primary_tag: Option<String>,
    secondary_tags: Vec<String>,
    sentiment: Option<String>,
}

impl ClassificationRecord {
    /// The all-absent record.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a tag record, keeping at most two non-blank secondary tags.
    pub fn tagged<I, S>(primary: impl Into<String>, secondary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let primary = primary.into();
        let primary = (!primary.trim().is_empty()).then(|| primary.trim().to_string());
        let secondary_tags = secondary
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .take(MAX_SECONDARY_TAGS)
            .collect();
        Self {
            primary_tag: primary,
            secondary_tags,
            sentiment: None,
        }
    }

    /// Attaches a sentiment label; blank labels leave it absent.
    pub fn with_sentiment(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.sentiment = (!label.trim().is_empty()).then(|| label.trim().to_string());
        self
    }

    pub fn primary_tag(&self) -> Option<&str> {
        self.primary_tag.as_deref()
    }

    pub fn secondary_tags(&self) -> &[String] {
        &self.secondary_tags
    }

    pub fn sentiment(&self) -> Option<&str> {
        self.sentiment.as_deref()
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.primary_tag.is_none() && self.secondary_tags.is_empty() && self.sentiment.is_none()
    }
}

/// Result of dispatching one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Exactly one record per batch item, in batch order.
    Success(Vec<ClassificationRecord>),
    /// The remote call failed; the batch range stays default-empty.
    Failure(RemoteError),
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success(_))
    }
}
