//! Per-Client Concurrency Quota
//!
//! Tracks how many generation jobs each client currently has in flight and
//! gates new admissions against a fixed ceiling. The store is process-local:
//! horizontally scaled instances each hold an independent view, so the quota
//! is per-process, not globally coordinated. A distributed deployment would
//! swap [`QuotaStore`] for an external atomic counter; call sites never see
//! the map directly.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::types::ClientId;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    /// In-flight count at decision time (before any increment)
    pub current: u32,
    pub limit: u32,
}

/// Injection seam for the client → in-flight-count map.
///
/// `admit` has a default check-then-increment implementation; stores that
/// can do better (an in-process shard lock, a remote atomic increment)
/// should override it so concurrent admissions on one bucket serialize.
pub trait QuotaStore: Send + Sync {
    /// Current in-flight count for a client (zero when absent)
    fn get(&self, client: &ClientId) -> u32;

    /// Record one admitted job
    fn increment(&self, client: &ClientId);

    /// Release one slot. Floored at zero: a duplicate decrement is a no-op,
    /// never a negative count.
    fn decrement(&self, client: &ClientId);

    /// Drop every entry unconditionally
    fn clear(&self);

    /// Atomically check the ceiling and, if under it, take a slot
    fn admit(&self, client: &ClientId, limit: u32) -> Admission {
        let current = self.get(client);
        if current < limit {
            self.increment(client);
            Admission {
                allowed: true,
                current,
                limit,
            }
        } else {
            Admission {
                allowed: false,
                current,
                limit,
            }
        }
    }
}

/// Process-memory quota store backed by a concurrent map.
///
/// Entries are created lazily on first admission attempt and never removed
/// individually; the periodic reset task clears the whole map instead.
#[derive(Default)]
pub struct InMemoryQuotaStore {
    counts: DashMap<ClientId, u32>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct client buckets currently tracked
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl QuotaStore for InMemoryQuotaStore {
    fn get(&self, client: &ClientId) -> u32 {
        self.counts.get(client).map(|c| *c).unwrap_or(0)
    }

    fn increment(&self, client: &ClientId) {
        *self.counts.entry(client.clone()).or_insert(0) += 1;
    }

    fn decrement(&self, client: &ClientId) {
        if let Some(mut count) = self.counts.get_mut(client) {
            *count = count.saturating_sub(1);
        }
    }

    fn clear(&self) {
        self.counts.clear();
    }

    fn admit(&self, client: &ClientId, limit: u32) -> Admission {
        // The entry guard holds the shard lock, so check-then-increment on
        // one bucket cannot interleave with another admission for it.
        let mut entry = self.counts.entry(client.clone()).or_insert(0);
        let current = *entry;
        if current < limit {
            *entry += 1;
            Admission {
                allowed: true,
                current,
                limit,
            }
        } else {
            Admission {
                allowed: false,
                current,
                limit,
            }
        }
    }
}

/// Admission gate over a [`QuotaStore`] with a fixed concurrency ceiling
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
    limit: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// Pure read: would a submission for this client be admitted right now?
    pub fn check(&self, client: &ClientId) -> Admission {
        let current = self.store.get(client);
        Admission {
            allowed: current < self.limit,
            current,
            limit: self.limit,
        }
    }

    /// Check the ceiling and take a slot in one step
    pub fn try_admit(&self, client: &ClientId) -> Admission {
        let admission = self.store.admit(client, self.limit);
        debug!(
            client = %client,
            allowed = admission.allowed,
            current = admission.current,
            limit = admission.limit,
            "Admission decision"
        );
        admission
    }

    /// Release the slot a job held. Called exactly once per job, on first
    /// observation of any terminal state; duplicates are floored at zero.
    pub fn release(&self, client: &ClientId) {
        self.store.decrement(client);
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
