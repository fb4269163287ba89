// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batched, concurrent classification of free-text comments.
//!
//! The pipeline partitions the input into fixed-size [`Batch`]es, sends each
//! to a [`RemoteClassifier`] with bounded concurrency, parses the responses
//! leniently and writes every batch's records back at their absolute
//! positions. The caller always receives one record per input text, whatever
//! happened to individual batches.
//!
//! [`Batch`]: tagwise_core::Batch
//! [`RemoteClassifier`]: tagwise_core::RemoteClassifier

pub mod assembler;
pub mod batch;
pub mod buffer;
pub mod cache;
pub mod dispatcher;
pub mod parser;
pub mod pipeline;
pub mod recording;

pub use assembler::assemble;
pub use batch::{build_batches, normalize_text};
pub use buffer::OutputBuffer;
pub use cache::{BatchCache, CacheKey};
pub use dispatcher::{BatchState, Dispatcher, RetryPolicy, RunSummary};
pub use parser::{ParsedBatch, parse_response};
pub use pipeline::{ClassificationRun, Pipeline, PipelineSettings};
