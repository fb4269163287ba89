// SPDX-FileCopyrightText: 2026 Tagwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bounded cache of successful batch outcomes.
//!
//! Keys are derived from the mode and the batch's normalized texts, so an
//! identical batch in a later run (or later in the same run) is answered
//! without a remote call. Failures are never stored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tagwise_core::{
    Batch, BatchOutcome, ClassificationMode, ClassificationRecord, Clock, SystemClock,
};

/// Content-derived identity of a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// SHA-256 over the mode and each text, length-prefixed so that
    /// `["ab", "c"]` and `["a", "bc"]` never collide.
    pub fn for_batch(batch: &Batch, mode: ClassificationMode) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(mode.to_string().as_bytes());
        for text in batch.texts() {
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<ClassificationRecord>,
    expires_at: Instant,
}

/// Concurrent map from [`CacheKey`] to successful records with a fixed TTL.
pub struct BatchCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl BatchCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored outcome if present and not yet expired.
    ///
    /// An expired entry is evicted on lookup.
    pub fn get(&self, key: &CacheKey) -> Option<BatchOutcome> {
        let now = self.clock.now();
        {
            let entry = self.entries.get(key)?;
            if now < entry.expires_at {
                return Some(BatchOutcome::Success(entry.records.clone()));
            }
        }
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    /// Stores a successful outcome; failures are ignored.
    ///
    /// Returns whether anything was stored.
    pub fn insert(&self, key: CacheKey, outcome: &BatchOutcome) -> bool {
        let BatchOutcome::Success(records) = outcome else {
            return false;
        };
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(
            key,
            CacheEntry {
                records: records.clone(),
                expires_at,
            },
        );
        true
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for BatchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
