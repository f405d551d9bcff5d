//! Read-through cache of all override values.
//!
//! The cache holds one immutable snapshot (`"key|language" -> value`) behind a
//! mutex. A snapshot expires after `ttl` without access (sliding expiry).
//! Every invalidation bumps a generation counter; a loader that started
//! before an invalidation does not install its result, so a write followed by
//! an invalidation can never be shadowed by a stale reload.

use crate::error::Result;
use crate::i18n::{CacheMetrics, CacheReport};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

pub type OverrideMap = HashMap<String, String>;

/// Default sliding lifetime of a loaded snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// `"key|language"`, both already normalized.
pub fn cache_key(key: &str, language: &str) -> String {
    format!("{}|{}", key, language)
}

struct Snapshot {
    values: Arc<OverrideMap>,
    last_access: Instant,
}

#[derive(Default)]
struct CacheState {
    generation: u64,
    snapshot: Option<Snapshot>,
}

pub struct OverrideCache {
    ttl: Duration,
    state: Mutex<CacheState>,
    metrics: CacheMetrics,
}

impl OverrideCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
            metrics: CacheMetrics::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The current snapshot, or the result of `load` when there is none or it
    /// expired.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<OverrideMap>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<OverrideMap>>,
    {
        let generation = {
            let mut state = self.lock();
            if let Some(snapshot) = state.snapshot.as_mut() {
                if snapshot.last_access.elapsed() < self.ttl {
                    snapshot.last_access = Instant::now();
                    self.metrics.record_hit();
                    return Ok(Arc::clone(&snapshot.values));
                }
                debug!("Override cache snapshot expired");
                state.snapshot = None;
            }
            self.metrics.record_miss();
            state.generation
        };

        let values = Arc::new(load().await?);
        self.metrics.record_reload();
        debug!("Loaded {} override values into cache", values.len());

        let mut state = self.lock();
        if state.generation == generation {
            state.snapshot = Some(Snapshot {
                values: Arc::clone(&values),
                last_access: Instant::now(),
            });
        }
        Ok(values)
    }

    /// Drop the snapshot; the next read reloads.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.snapshot = None;
        self.metrics.record_invalidation();
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    pub fn report(&self) -> CacheReport {
        self.metrics.report()
    }
}

impl Default for OverrideCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
