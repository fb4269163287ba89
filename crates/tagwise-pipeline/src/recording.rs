// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call
//! is a no-op.

use metrics::{describe_counter, describe_histogram};

/// Register all Tagwise metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "tagwise_batches_total",
        "Batches settled, labelled by outcome"
    );
    describe_counter!(
        "tagwise_remote_calls_total",
        "Remote classifier calls, labelled by result"
    );
    describe_counter!("tagwise_cache_lookups_total", "Cache lookups by result");
    describe_counter!(
        "tagwise_degraded_lines_total",
        "Response lines replaced by empty records"
    );
    describe_histogram!(
        "tagwise_remote_latency_seconds",
        "Remote classifier latency in seconds"
    );
}

/// Record a settled batch; `outcome` is `success` or `failure`.
pub fn record_batch(outcome: &'static str) {
    metrics::counter!("tagwise_batches_total", "outcome" => outcome).increment(1);
}

/// Record one remote call attempt.
pub fn record_remote_call(ok: bool, seconds: f64) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("tagwise_remote_calls_total", "result" => result).increment(1);
    metrics::histogram!("tagwise_remote_latency_seconds").record(seconds);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("tagwise_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_degraded(lines: usize) {
    if lines > 0 {
        metrics::counter!("tagwise_degraded_lines_total").increment(lines as u64);
    }
}
