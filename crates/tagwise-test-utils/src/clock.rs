// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manually advanced clock for expiry tests.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tagwise_core::Clock;

/// A [`Clock`] frozen at construction until [`ManualClock::advance`] is called.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
