// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tagwise classification pipeline.
//!
//! This crate provides the error taxonomy, the domain types that flow
//! between the batch builder, dispatcher and assembler, and the traits
//! remote classifiers and clocks implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{RemoteError, TagwiseError};
pub use types::{
    Batch, BatchOutcome, ClassificationMode, ClassificationRecord, InputItem, MAX_SECONDARY_TAGS,
};

pub use traits::{Clock, RemoteClassifier, SystemClock};
