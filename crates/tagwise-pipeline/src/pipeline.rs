// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end classification of an ordered list of texts.

use std::sync::Arc;
use std::time::Duration;

use tagwise_config::TagwiseConfig;
use tagwise_core::{
    ClassificationMode, ClassificationRecord, Clock, RemoteClassifier, SystemClock, TagwiseError,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assembler::assemble;
use crate::batch::build_batches;
use crate::cache::BatchCache;
use crate::dispatcher::{Dispatcher, RetryPolicy, RunSummary};

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub batch_size: usize,
    pub max_workers: usize,
    /// Overrides the mode's default per-item character budget.
    pub max_item_text_length: Option<usize>,
    pub mode: ClassificationMode,
    /// Zero disables caching.
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_workers: 4,
            max_item_text_length: None,
            mode: ClassificationMode::default(),
            cache_ttl: Duration::from_secs(3600),
            retry: RetryPolicy::none(),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &TagwiseConfig) -> Self {
        let pipeline = &config.pipeline;
        Self {
            batch_size: pipeline.batch_size,
            max_workers: pipeline.max_workers,
            max_item_text_length: pipeline.max_item_text_length,
            mode: pipeline.mode,
            cache_ttl: Duration::from_secs(config.cache.ttl_secs),
            retry: RetryPolicy::linear(
                pipeline.max_retries,
                Duration::from_millis(pipeline.retry_backoff_ms),
            ),
        }
    }

    /// Effective per-item character budget.
    pub fn max_text_length(&self) -> usize {
        self.max_item_text_length
            .unwrap_or_else(|| self.mode.default_max_text_length())
    }

    /// Rejects settings no run could honour.
    pub fn validate(&self) -> Result<(), TagwiseError> {
        if self.batch_size == 0 {
            return Err(TagwiseError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(TagwiseError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.max_item_text_length == Some(0) {
            return Err(TagwiseError::Config(
                "max_item_text_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Records for every input position plus how the run went.
#[derive(Debug, Clone)]
pub struct ClassificationRun {
    /// One record per input text, in input order.
    pub records: Vec<ClassificationRecord>,
    pub summary: RunSummary,
}

/// Batches texts, dispatches them concurrently and reassembles the results.
///
/// The cache lives as long as the pipeline, so repeated runs over the same
/// texts are answered locally until entries expire.
#[derive(Debug)]
pub struct Pipeline {
    settings: PipelineSettings,
    dispatcher: Dispatcher,
    cache: Option<Arc<BatchCache>>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        classifier: Arc<dyn RemoteClassifier>,
    ) -> Result<Self, TagwiseError> {
        Self::with_clock(settings, classifier, Arc::new(SystemClock))
    }

    /// Like [`Pipeline::new`] with an explicit clock for cache expiry.
    pub fn with_clock(
        settings: PipelineSettings,
        classifier: Arc<dyn RemoteClassifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TagwiseError> {
        settings.validate()?;

        let cache = (!settings.cache_ttl.is_zero())
            .then(|| Arc::new(BatchCache::with_clock(settings.cache_ttl, clock)));

        info!(
            classifier = classifier.name(),
            mode = %settings.mode,
            batch_size = settings.batch_size,
            max_workers = settings.max_workers,
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            "pipeline ready"
        );

        let mut dispatcher = Dispatcher::new(classifier, settings.mode, settings.max_workers)?
            .with_retry(settings.retry);
        if let Some(cache) = &cache {
            dispatcher = dispatcher.with_cache(Arc::clone(cache));
        }

        Ok(Self {
            settings,
            dispatcher,
            cache,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The shared batch cache, absent when caching is disabled.
    pub fn cache(&self) -> Option<&Arc<BatchCache>> {
        self.cache.as_ref()
    }

    /// Classifies `texts`, returning exactly one record per text.
    pub async fn run<S>(&self, texts: &[S]) -> Result<ClassificationRun, TagwiseError>
    where
        S: AsRef<str> + Sync,
    {
        self.run_until_cancelled(texts, &CancellationToken::new())
            .await
    }

    /// Classifies `texts`, stopping early when `cancel` fires.
    ///
    /// A cancelled run still returns one record per text; positions of
    /// batches that had not finished are empty.
    pub async fn run_until_cancelled<S>(
        &self,
        texts: &[S],
        cancel: &CancellationToken,
    ) -> Result<ClassificationRun, TagwiseError>
    where
        S: AsRef<str> + Sync,
    {
        let total = texts.len();
        let batches = build_batches(
            texts,
            self.settings.batch_size,
            self.settings.max_text_length(),
        )?;
        info!(
            items = total,
            batches = batches.len(),
            mode = %self.settings.mode,
            "classification run started"
        );

        let (buffer, summary) = self.dispatcher.dispatch(batches, total, cancel).await?;
        let records = assemble(buffer, total)?;

        info!(
            succeeded = summary.succeeded_batches,
            failed = summary.failed_batches,
            unfinished = summary.unfinished_batches,
            cache_hits = summary.cache_hits,
            degraded_lines = summary.degraded_lines,
            cancelled = summary.cancelled,
            "classification run finished"
        );

        Ok(ClassificationRun { records, summary })
    }
}
