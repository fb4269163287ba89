// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock remote classifier for deterministic pipeline tests.
//!
//! `MockClassifier` implements `RemoteClassifier` with a scriptable
//! responder, per-batch failures keyed by batch start position, optional
//! latency, and counters for calls and peak concurrency.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tagwise_core::{Batch, ClassificationMode, RemoteClassifier, RemoteError};

type Responder = dyn Fn(&Batch, ClassificationMode) -> Result<String, RemoteError> + Send + Sync;
type DelayFn = dyn Fn(&Batch) -> Duration + Send + Sync;

/// Scripted failure for one batch: the error and how many more times to raise it.
struct ScriptedFailure {
    error: RemoteError,
    remaining: Option<usize>,
}

/// A mock classifier whose answers are computed from the batch it receives.
pub struct MockClassifier {
    responder: Box<Responder>,
    delay: Box<DelayFn>,
    failures: Mutex<HashMap<usize, ScriptedFailure>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Well-formed response for every item of `batch`, derived from positions.
///
/// Tags-only lines read `tag-<pos>|sub-<pos>-a, sub-<pos>-b`; tags+sentiment
/// lines read `tag-<pos>, sub-<pos>-a, sub-<pos>-b | 感情: ニュートラル`.
pub fn echo_response(batch: &Batch, mode: ClassificationMode) -> String {
    batch
        .items()
        .iter()
        .map(|item| {
            let p = item.position;
            match mode {
                ClassificationMode::TagsOnly => format!("tag-{p}|sub-{p}-a, sub-{p}-b\n"),
                ClassificationMode::TagsSentiment => {
                    format!("tag-{p}, sub-{p}-a, sub-{p}-b | 感情: ニュートラル\n")
                }
            }
        })
        .collect()
}

impl MockClassifier {
    /// A classifier that answers every batch with [`echo_response`].
    pub fn echo() -> Self {
        Self::with_responder(|batch, mode| Ok(echo_response(batch, mode)))
    }

    /// A classifier driven by a custom responder.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&Batch, ClassificationMode) -> Result<String, RemoteError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: Box::new(|_| Duration::ZERO),
            failures: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Always fail the batch starting at `start` with `error`.
    pub fn failing_batch(self, start: usize, error: RemoteError) -> Self {
        self.script_failure(start, error, None)
    }

    /// Fail the batch starting at `start` for its first `times` calls only.
    pub fn flaky_batch(self, start: usize, times: usize, error: RemoteError) -> Self {
        self.script_failure(start, error, Some(times))
    }

    /// Sleep for `delay` inside every call.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.with_delay_fn(move |_| delay)
    }

    /// Sleep for a batch-dependent duration inside every call.
    pub fn with_delay_fn<F>(mut self, delay: F) -> Self
    where
        F: Fn(&Batch) -> Duration + Send + Sync + 'static,
    {
        self.delay = Box::new(delay);
        self
    }

    /// Total number of `classify` invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running `classify` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn script_failure(self, start: usize, error: RemoteError, remaining: Option<usize>) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(start, ScriptedFailure { error, remaining });
        self
    }

    fn scripted_failure(&self, start: usize) -> Option<RemoteError> {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let failure = failures.get_mut(&start)?;
        match failure.remaining.as_mut() {
            None => Some(failure.error.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(failure.error.clone())
            }
        }
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::echo()
    }
}

/// Decrements the in-flight counter even when the call future is dropped.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteClassifier for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    async fn classify(
        &self,
        batch: &Batch,
        mode: ClassificationMode,
    ) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        let delay = (self.delay)(batch);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.scripted_failure(batch.start()) {
            return Err(error);
        }
        (self.responder)(batch, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagwise_core::InputItem;

    fn batch(start: usize, len: usize) -> Batch {
        let items = (start..start + len)
            .map(|position| InputItem {
                position,
                text: format!("comment {position}"),
            })
            .collect();
        Batch::new(0, items).unwrap()
    }

    #[tokio::test]
    async fn echo_answers_one_line_per_item() {
        let mock = MockClassifier::echo();
        let text = mock
            .classify(&batch(3, 2), ClassificationMode::TagsOnly)
            .await
            .unwrap();
        assert_eq!(text, "tag-3|sub-3-a, sub-3-b\ntag-4|sub-4-a, sub-4-b\n");
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.name(), "mock-classifier");
    }

    #[tokio::test]
    async fn echo_sentiment_grammar() {
        let text = echo_response(&batch(0, 1), ClassificationMode::TagsSentiment);
        assert_eq!(text, "tag-0, sub-0-a, sub-0-b | 感情: ニュートラル\n");
    }

    #[tokio::test]
    async fn failing_batch_always_fails() {
        let mock = MockClassifier::echo().failing_batch(5, RemoteError::EmptyResponse);
        for _ in 0..3 {
            let err = mock
                .classify(&batch(5, 1), ClassificationMode::TagsOnly)
                .await
                .unwrap_err();
            assert_eq!(err, RemoteError::EmptyResponse);
        }
        assert!(mock
            .classify(&batch(0, 1), ClassificationMode::TagsOnly)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn flaky_batch_recovers() {
        let error = RemoteError::RateLimited {
            message: "slow".into(),
        };
        let mock = MockClassifier::echo().flaky_batch(0, 2, error.clone());
        let b = batch(0, 1);
        assert_eq!(
            mock.classify(&b, ClassificationMode::TagsOnly).await,
            Err(error.clone())
        );
        assert_eq!(
            mock.classify(&b, ClassificationMode::TagsOnly).await,
            Err(error)
        );
        assert!(mock.classify(&b, ClassificationMode::TagsOnly).await.is_ok());
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn tracks_peak_concurrency() {
        let mock = std::sync::Arc::new(
            MockClassifier::echo().with_delay(Duration::from_millis(100)),
        );
        let mut handles = Vec::new();
        for start in [0, 10, 20] {
            let mock = mock.clone();
            handles.push(tokio::spawn(async move {
                mock.classify(&batch(start, 1), ClassificationMode::TagsOnly)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(mock.max_in_flight(), 3);
        assert_eq!(mock.calls(), 3);
    }
}
