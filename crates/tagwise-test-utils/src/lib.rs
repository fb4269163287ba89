// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tagwise pipeline tests.
//!
//! Provides deterministic stand-ins for the remote service and the clock so
//! tests run without network access or wall-clock sleeps.
//!
//! # Components
//!
//! - [`MockClassifier`] - Scriptable remote classifier with call accounting
//! - [`ManualClock`] - Clock that only moves when told to

pub mod clock;
pub mod mock_classifier;

pub use clock::ManualClock;
pub use mock_classifier::{MockClassifier, echo_response};
