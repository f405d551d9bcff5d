//! Override cache metrics.
//!
//! Counters are owned by each cache instance so isolated caches (tests, several
//! stores in one process) never share state.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one override cache.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Lookups served from a live snapshot
    hits: AtomicUsize,

    /// Lookups that found no live snapshot
    misses: AtomicUsize,

    /// Full reloads from the persistent store
    reloads: AtomicUsize,

    /// Explicit invalidations
    invalidations: AtomicUsize,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Snapshot of the counters.
    pub fn report(&self) -> CacheReport {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheReport {
            hits,
            misses,
            hit_rate,
            reloads: self.reloads(),
            invalidations: self.invalidations(),
        }
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub hits: usize,
    pub misses: usize,

    /// Hit rate as a percentage (0-100)
    pub hit_rate: f64,

    pub reloads: usize,
    pub invalidations: usize,
}
