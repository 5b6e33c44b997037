//! Per-key TTL cache with a configurable failure policy

use crate::clock::{Clock, SystemClock};
use crate::constants::FAILURE_SENTINEL;
use crate::transport::Unavailable;
use log::{debug, trace};
use remote_sens_types::FailurePolicy;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Last computed value for one metric key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub value: f64,
    pub observed_at: Instant,
}

/// Staleness tracking for the metric keys of one source
///
/// Entries are replaced whole, so `value` and `observed_at` always move
/// together.
pub struct TtlCache {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    policy: FailurePolicy,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(ttl: Duration, policy: FailurePolicy) -> Self {
        Self::with_clock(ttl, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, policy: FailurePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            policy,
            clock,
        }
    }

    /// Return the fresh cached value for `key`, or run `compute` once
    ///
    /// On failure the configured policy decides the outcome. `None` is only
    /// returned when retaining and nothing was ever cached for `key`.
    pub fn get_or_compute<F>(&mut self, key: &str, compute: F) -> Option<f64>
    where
        F: FnOnce() -> Result<f64, Unavailable>,
    {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            if now.saturating_duration_since(entry.observed_at) < self.ttl {
                trace!("cache hit for {}", key);
                return Some(entry.value);
            }
        }

        match compute() {
            Ok(value) => {
                debug!("cache refresh for {}: {}", key, value);
                self.store(key, value, now);
                Some(value)
            }
            Err(reason) => match self.policy {
                FailurePolicy::Accept => {
                    debug!("{} unavailable ({}), storing sentinel", key, reason);
                    self.store(key, FAILURE_SENTINEL, now);
                    Some(FAILURE_SENTINEL)
                }
                FailurePolicy::Retain => {
                    debug!("{} unavailable ({}), keeping last value", key, reason);
                    self.cached(key)
                }
            },
        }
    }

    fn store(&mut self, key: &str, value: f64, observed_at: Instant) {
        self.entries
            .insert(key.to_string(), CacheEntry { value, observed_at });
    }

    /// Read the cached value without computing
    pub fn cached(&self, key: &str) -> Option<f64> {
        self.entries.get(key).map(|e| e.value)
    }

    pub fn entry(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;

    const TTL: Duration = Duration::from_secs(30);

    fn cache(policy: FailurePolicy) -> (TtlCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(TTL, policy, Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_compute_at_most_once_within_ttl() {
        let (mut cache, clock) = cache(FailurePolicy::Retain);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(42.0)
        };

        assert_eq!(cache.get_or_compute("k", compute), Some(42.0));
        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get_or_compute("k", compute), Some(42.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_recompute_after_ttl_updates_observed_at() {
        let (mut cache, clock) = cache(FailurePolicy::Retain);
        cache.get_or_compute("k", || Ok(1.0));
        let first = cache.entry("k").unwrap().observed_at;

        clock.advance(TTL);
        let calls = Cell::new(0);
        let value = cache.get_or_compute("k", || {
            calls.set(calls.get() + 1);
            Ok(2.0)
        });

        assert_eq!(value, Some(2.0));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.entry("k").unwrap().observed_at - first, TTL);
    }

    #[test]
    fn test_retain_policy_leaves_entry_untouched() {
        let (mut cache, clock) = cache(FailurePolicy::Retain);
        cache.get_or_compute("k", || Ok(5.0));
        let before = *cache.entry("k").unwrap();

        clock.advance(Duration::from_secs(40));
        let value = cache.get_or_compute("k", || Err(Unavailable::Timeout));

        assert_eq!(value, Some(5.0));
        assert_eq!(*cache.entry("k").unwrap(), before);

        // Still stale, so the next call tries again
        let value = cache.get_or_compute("k", || Ok(6.0));
        assert_eq!(value, Some(6.0));
    }

    #[test]
    fn test_retain_policy_cold_failure_is_no_value() {
        let (mut cache, _clock) = cache(FailurePolicy::Retain);
        let value = cache.get_or_compute("k", || Err(Unavailable::NotConfigured));
        assert_eq!(value, None);
        assert!(cache.entry("k").is_none());
    }

    #[test]
    fn test_accept_policy_stores_sentinel_and_resets_timestamp() {
        let (mut cache, clock) = cache(FailurePolicy::Accept);
        cache.get_or_compute("k", || Ok(5.0));
        let first = cache.entry("k").unwrap().observed_at;

        clock.advance(Duration::from_secs(31));
        let value = cache.get_or_compute("k", || Err(Unavailable::Status(500)));

        assert_eq!(value, Some(FAILURE_SENTINEL));
        let entry = cache.entry("k").unwrap();
        assert_eq!(entry.value, FAILURE_SENTINEL);
        assert_eq!(entry.observed_at - first, Duration::from_secs(31));
    }

    #[test]
    fn test_accept_policy_scenario() {
        let (mut cache, clock) = cache(FailurePolicy::Accept);
        let mut script = vec![Ok(10.0), Err(Unavailable::Timeout), Ok(20.0)].into_iter();
        let mut read = |cache: &mut TtlCache| {
            cache.get_or_compute("k", || script.next().unwrap_or(Err(Unavailable::Timeout)))
        };

        assert_eq!(read(&mut cache), Some(10.0));
        clock.set(Duration::from_secs(5));
        assert_eq!(read(&mut cache), Some(10.0));
        clock.set(Duration::from_secs(31));
        assert_eq!(read(&mut cache), Some(0.0));
        clock.set(Duration::from_secs(32));
        assert_eq!(read(&mut cache), Some(0.0));
    }

    #[test]
    fn test_keys_are_independent() {
        let (mut cache, _clock) = cache(FailurePolicy::Retain);
        cache.get_or_compute("a", || Ok(1.0));
        cache.get_or_compute("b", || Ok(2.0));
        assert_eq!(cache.cached("a"), Some(1.0));
        assert_eq!(cache.cached("b"), Some(2.0));
        assert_eq!(cache.cached("c"), None);
    }
}
