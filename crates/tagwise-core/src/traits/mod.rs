// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions.
//!
//! Remote classifiers use `#[async_trait]` for dynamic dispatch
//! compatibility.

pub mod classifier;
pub mod clock;

pub use classifier::RemoteClassifier;
pub use clock::{Clock, SystemClock};
