// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent, failure-isolated dispatch of batches to a remote classifier.
//!
//! Every batch runs as its own tokio task. A semaphore bounds how many
//! tasks talk to the classifier at once; the collection loop is the only
//! writer of the [`OutputBuffer`] and places each finished batch at its
//! absolute positions, so completion order never affects the result.
//!
//! A failed remote call settles its batch as a failure and leaves its range
//! empty. It never cancels, delays or corrupts other batches.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strum::Display;
use tagwise_core::{
    Batch, BatchOutcome, ClassificationMode, RemoteClassifier, RemoteError, TagwiseError,
};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::buffer::OutputBuffer;
use crate::cache::{BatchCache, CacheKey};
use crate::parser::parse_response;
use crate::recording;

/// Lifecycle of one batch unit, emitted in trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BatchState {
    Pending,
    CacheHit,
    Dispatched,
    Parsed,
    Failed,
    Written,
}

/// Extra attempts for transient remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first; zero disables retrying.
    pub max_retries: u32,
    /// Base delay; attempt `k` waits `backoff * k` before retrying.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn linear(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Counters describing how a run went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_items: usize,
    pub total_batches: usize,
    pub succeeded_batches: usize,
    pub failed_batches: usize,
    /// Batches abandoned by cancellation before they settled.
    pub unfinished_batches: usize,
    pub cache_hits: usize,
    pub remote_calls: usize,
    pub degraded_lines: usize,
    pub padded_records: usize,
    pub cancelled: bool,
}

impl RunSummary {
    /// Share of batches whose range ended up empty, in `[0, 1]`.
    pub fn failure_rate(&self) -> f64 {
        if self.total_batches == 0 {
            return 0.0;
        }
        (self.failed_batches + self.unfinished_batches) as f64 / self.total_batches as f64
    }

    /// True when every batch succeeded and nothing was cancelled.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.succeeded_batches == self.total_batches
    }
}

/// What one unit reports back to the collection loop.
#[derive(Debug)]
struct UnitReport {
    index: usize,
    range: Range<usize>,
    outcome: BatchOutcome,
    from_cache: bool,
    attempts: u32,
    degraded_lines: usize,
    padded: usize,
}

/// Everything a unit needs, cheap to clone into each task.
#[derive(Clone)]
struct Unit {
    classifier: Arc<dyn RemoteClassifier>,
    cache: Option<Arc<BatchCache>>,
    mode: ClassificationMode,
    retry: RetryPolicy,
}

impl Unit {
    async fn run(self, batch: Batch) -> UnitReport {
        let index = batch.index();
        let range = batch.range();
        debug!(batch = index, start = range.start, len = batch.len(), state = %BatchState::Pending);

        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::for_batch(&batch, self.mode));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            let cached = cache.get(key);
            recording::record_cache_lookup(cached.is_some());
            if let Some(outcome) = cached {
                debug!(batch = index, state = %BatchState::CacheHit);
                return UnitReport {
                    index,
                    range,
                    outcome,
                    from_cache: true,
                    attempts: 0,
                    degraded_lines: 0,
                    padded: 0,
                };
            }
        }

        debug!(batch = index, state = %BatchState::Dispatched);
        let (result, attempts) = self.classify_with_retry(&batch).await;

        match result {
            Ok(raw) => {
                let parsed = parse_response(&raw, batch.len(), self.mode);
                debug!(
                    batch = index,
                    state = %BatchState::Parsed,
                    degraded = parsed.degraded_lines,
                    padded = parsed.padded,
                    "response parsed"
                );
                let outcome = BatchOutcome::Success(parsed.records);
                if let (Some(cache), Some(key)) = (&self.cache, key) {
                    cache.insert(key, &outcome);
                }
                UnitReport {
                    index,
                    range,
                    outcome,
                    from_cache: false,
                    attempts,
                    degraded_lines: parsed.degraded_lines,
                    padded: parsed.padded,
                }
            }
            Err(err) => {
                debug!(batch = index, state = %BatchState::Failed, error = %err);
                UnitReport {
                    index,
                    range,
                    outcome: BatchOutcome::Failure(err),
                    from_cache: false,
                    attempts,
                    degraded_lines: 0,
                    padded: 0,
                }
            }
        }
    }

    async fn classify_with_retry(&self, batch: &Batch) -> (Result<String, RemoteError>, u32) {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let started = Instant::now();
            let result = self.classifier.classify(batch, self.mode).await;
            recording::record_remote_call(result.is_ok(), started.elapsed().as_secs_f64());

            match result {
                Err(err) if err.is_transient() && attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        batch = batch.index(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient classifier error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return (result, attempt),
            }
        }
    }
}

/// Runs batches against a classifier with at most `max_workers` in flight.
pub struct Dispatcher {
    unit: Unit,
    max_workers: usize,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<dyn RemoteClassifier>,
        mode: ClassificationMode,
        max_workers: usize,
    ) -> Result<Self, TagwiseError> {
        if max_workers == 0 {
            return Err(TagwiseError::Config(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            unit: Unit {
                classifier,
                cache: None,
                mode,
                retry: RetryPolicy::none(),
            },
            max_workers,
        })
    }

    /// Consult and fill `cache` around every remote call.
    pub fn with_cache(mut self, cache: Arc<BatchCache>) -> Self {
        self.unit.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.unit.retry = retry;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn mode(&self) -> ClassificationMode {
        self.unit.mode
    }

    /// Dispatches every batch and returns the filled buffer.
    ///
    /// Returns once every unit has settled, or as soon as `cancel` fires
    /// and the remaining units have been aborted. Units that finished
    /// before cancellation are still written.
    pub async fn dispatch(
        &self,
        batches: Vec<Batch>,
        total_items: usize,
        cancel: &CancellationToken,
    ) -> Result<(OutputBuffer, RunSummary), TagwiseError> {
        let mut buffer = OutputBuffer::new(total_items);
        let mut summary = RunSummary {
            total_items,
            total_batches: batches.len(),
            ..RunSummary::default()
        };

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut units = JoinSet::new();
        let mut ranges: HashMap<Id, (usize, Range<usize>)> =
            HashMap::with_capacity(batches.len());
        for batch in batches {
            let unit = self.unit.clone();
            let permits = Arc::clone(&permits);
            let slot = (batch.index(), batch.range());
            let handle = units.spawn(async move {
                // The semaphore is never closed, so acquisition only waits.
                let _permit = permits.acquire_owned().await;
                unit.run(batch).await
            });
            ranges.insert(handle.id(), slot);
        }

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !summary.cancelled => {
                    info!(pending = units.len(), "run cancelled, abandoning unfinished batches");
                    summary.cancelled = true;
                    units.abort_all();
                    continue;
                }
                joined = units.join_next_with_id() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((_, report)) => settle(report, &mut buffer, &mut summary)?,
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    let Some((index, range)) = ranges.remove(&e.id()) else {
                        return Err(TagwiseError::Internal(format!(
                            "panicked task {} has no batch",
                            e.id()
                        )));
                    };
                    error!(
                        batch = index,
                        start = range.start,
                        end = range.end,
                        error = %e,
                        "batch unit panicked, leaving its range empty"
                    );
                    buffer.write_empty(range)?;
                    summary.failed_batches += 1;
                    recording::record_batch("failure");
                    debug!(batch = index, state = %BatchState::Written);
                }
            }
        }

        summary.unfinished_batches = summary
            .total_batches
            .saturating_sub(summary.succeeded_batches + summary.failed_batches);
        Ok((buffer, summary))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.unit.mode)
            .field("max_workers", &self.max_workers)
            .field("retry", &self.unit.retry)
            .field("cached", &self.unit.cache.is_some())
            .finish()
    }
}

/// Writes one settled unit into the buffer and folds it into the summary.
fn settle(
    report: UnitReport,
    buffer: &mut OutputBuffer,
    summary: &mut RunSummary,
) -> Result<(), TagwiseError> {
    summary.remote_calls += report.attempts as usize;
    if report.from_cache {
        summary.cache_hits += 1;
    }

    match report.outcome {
        BatchOutcome::Success(records) => {
            buffer.write(report.range.start, records)?;
            summary.succeeded_batches += 1;
            summary.degraded_lines += report.degraded_lines;
            summary.padded_records += report.padded;
            recording::record_batch("success");
            recording::record_degraded(report.degraded_lines);
        }
        BatchOutcome::Failure(err) => {
            warn!(
                batch = report.index,
                start = report.range.start,
                end = report.range.end,
                attempts = report.attempts,
                error = %err,
                "batch failed, leaving its range empty"
            );
            buffer.write_empty(report.range.clone())?;
            summary.failed_batches += 1;
            recording::record_batch("failure");
        }
    }

    debug!(batch = report.index, state = %BatchState::Written);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::build_batches;
    use tagwise_test_utils::{MockClassifier, echo_response};

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("comment {i}")).collect()
    }

    async fn run(
        dispatcher: &Dispatcher,
        n: usize,
        batch_size: usize,
    ) -> (OutputBuffer, RunSummary) {
        let batches = build_batches(&texts(n), batch_size, 200).unwrap();
        dispatcher
            .dispatch(batches, n, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = Dispatcher::new(
            Arc::new(MockClassifier::echo()),
            ClassificationMode::TagsOnly,
            0,
        )
        .err()
        .unwrap();
        assert!(matches!(err, TagwiseError::Config(_)));
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::linear(3, Duration::from_millis(250));
        assert_eq!(policy.delay_after(1), Duration::from_millis(250));
        assert_eq!(policy.delay_after(3), Duration::from_millis(750));
        assert_eq!(RetryPolicy::default(), RetryPolicy::none());
    }

    #[test]
    fn failure_rate_counts_failed_and_unfinished() {
        let summary = RunSummary {
            total_batches: 4,
            succeeded_batches: 2,
            failed_batches: 1,
            unfinished_batches: 1,
            ..RunSummary::default()
        };
        assert!((summary.failure_rate() - 0.5).abs() < f64::EPSILON);
        assert!(!summary.is_complete());
        assert_eq!(RunSummary::default().failure_rate(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_never_exceeds_worker_bound() {
        let mock = Arc::new(MockClassifier::echo().with_delay(Duration::from_millis(50)));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 3).unwrap();

        let (buffer, summary) = run(&dispatcher, 50, 5).await;

        assert_eq!(mock.calls(), 10);
        assert_eq!(mock.max_in_flight(), 3);
        assert_eq!(summary.succeeded_batches, 10);
        assert_eq!(buffer.written(), 50);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_completion_keeps_positions() {
        // Earlier batches finish last.
        let mock = Arc::new(
            MockClassifier::echo()
                .with_delay_fn(|batch| Duration::from_millis(100 - batch.start() as u64)),
        );
        let dispatcher = Dispatcher::new(mock, ClassificationMode::TagsOnly, 8).unwrap();

        let (buffer, _) = run(&dispatcher, 24, 3).await;

        for (position, record) in buffer.records().iter().enumerate() {
            assert_eq!(record.primary_tag(), Some(format!("tag-{position}").as_str()));
        }
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_batch_leaves_only_its_range_empty() {
        let mock = Arc::new(MockClassifier::echo().failing_batch(
            4,
            RemoteError::Api {
                status: 400,
                message: "bad".into(),
            },
        ));
        let dispatcher = Dispatcher::new(mock, ClassificationMode::TagsOnly, 2).unwrap();

        let (buffer, summary) = run(&dispatcher, 10, 4).await;

        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.succeeded_batches, 2);
        assert_eq!(buffer.written(), 10);
        for (position, record) in buffer.records().iter().enumerate() {
            assert_eq!(record.is_empty(), (4..8).contains(&position), "position {position}");
        }
        assert!(logs_contain("batch failed, leaving its range empty"));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_with_backoff() {
        let mock = Arc::new(MockClassifier::echo().flaky_batch(
            0,
            2,
            RemoteError::RateLimited {
                message: "slow down".into(),
            },
        ));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 1)
            .unwrap()
            .with_retry(RetryPolicy::linear(2, Duration::from_secs(1)));

        let started = tokio::time::Instant::now();
        let (buffer, summary) = run(&dispatcher, 3, 3).await;

        assert_eq!(mock.calls(), 3);
        assert_eq!(summary.remote_calls, 3);
        assert_eq!(summary.succeeded_batches, 1);
        assert_eq!(buffer.records()[2].primary_tag(), Some("tag-2"));
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_are_bounded() {
        let mock = Arc::new(MockClassifier::echo().failing_batch(
            0,
            RemoteError::Server {
                status: 529,
                message: "overloaded".into(),
            },
        ));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 1)
            .unwrap()
            .with_retry(RetryPolicy::linear(2, Duration::from_millis(10)));

        let (_, summary) = run(&dispatcher, 2, 2).await;

        assert_eq!(mock.calls(), 3);
        assert_eq!(summary.failed_batches, 1);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let mock = Arc::new(MockClassifier::echo().failing_batch(
            0,
            RemoteError::Auth {
                message: "invalid x-api-key".into(),
            },
        ));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 1)
            .unwrap()
            .with_retry(RetryPolicy::linear(5, Duration::from_millis(1)));

        let (_, summary) = run(&dispatcher, 2, 2).await;

        assert_eq!(mock.calls(), 1);
        assert_eq!(summary.failed_batches, 1);
    }

    #[tokio::test]
    async fn cached_batches_skip_the_classifier() {
        let mock = Arc::new(MockClassifier::echo());
        let cache = Arc::new(BatchCache::new(Duration::from_secs(60)));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 2)
            .unwrap()
            .with_cache(cache.clone());

        let (first, _) = run(&dispatcher, 6, 2).await;
        assert_eq!(mock.calls(), 3);
        assert_eq!(cache.len(), 3);

        let (second, summary) = run(&dispatcher, 6, 2).await;
        assert_eq!(mock.calls(), 3);
        assert_eq!(summary.cache_hits, 3);
        assert_eq!(summary.remote_calls, 0);
        assert_eq!(first.records(), second.records());
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let mock = Arc::new(
            MockClassifier::echo().flaky_batch(0, 1, RemoteError::EmptyResponse),
        );
        let cache = Arc::new(BatchCache::new(Duration::from_secs(60)));
        let dispatcher = Dispatcher::new(mock.clone(), ClassificationMode::TagsOnly, 1)
            .unwrap()
            .with_cache(cache.clone());

        let (_, summary) = run(&dispatcher, 2, 2).await;
        assert_eq!(summary.failed_batches, 1);
        assert!(cache.is_empty());

        let (buffer, summary) = run(&dispatcher, 2, 2).await;
        assert_eq!(summary.succeeded_batches, 1);
        assert_eq!(summary.cache_hits, 0);
        assert_eq!(buffer.records()[0].primary_tag(), Some("tag-0"));
    }

    #[tokio::test]
    async fn panicking_unit_counts_as_failed() {
        let mock = Arc::new(MockClassifier::with_responder(|batch, mode| {
            if batch.start() == 2 {
                panic!("responder exploded");
            }
            Ok(echo_response(batch, mode))
        }));
        let dispatcher = Dispatcher::new(mock, ClassificationMode::TagsOnly, 2).unwrap();

        let (buffer, summary) = run(&dispatcher, 6, 2).await;

        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.succeeded_batches, 2);
        assert_eq!(summary.unfinished_batches, 0);
        assert_eq!(buffer.written(), buffer.len());
        assert!(buffer.records()[2].is_empty());
        assert!(buffer.records()[3].is_empty());
        assert_eq!(buffer.records()[4].primary_tag(), Some("tag-4"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_keeps_finished_batches() {
        let mock = Arc::new(MockClassifier::echo().with_delay_fn(|batch| {
            if batch.start() == 0 {
                Duration::from_millis(100)
            } else {
                Duration::from_secs(60)
            }
        }));
        let dispatcher = Dispatcher::new(mock, ClassificationMode::TagsOnly, 4).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let batches = build_batches(&texts(8), 2, 200).unwrap();
        let (buffer, summary) = dispatcher.dispatch(batches, 8, &cancel).await.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.succeeded_batches, 1);
        assert_eq!(summary.unfinished_batches, 3);
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.records()[1].primary_tag(), Some("tag-1"));
        assert!(buffer.records()[2..].iter().all(|r| r.is_empty()));
    }

    #[tokio::test]
    async fn no_batches_settle_immediately() {
        let dispatcher = Dispatcher::new(
            Arc::new(MockClassifier::echo()),
            ClassificationMode::TagsSentiment,
            4,
        )
        .unwrap();
        let (buffer, summary) = run(&dispatcher, 0, 20).await;
        assert!(buffer.is_empty());
        assert_eq!(summary, RunSummary::default());
        assert!(summary.is_complete());
    }
}
