//! Time source used for cache freshness checks

use std::time::Instant;

/// Monotonic time source
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-utils"))]
mod manual {
    use super::Clock;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Clock that only moves when told to
    ///
    /// Clones share the same offset, so a test can keep one handle and
    /// hand another to the code under test.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
            *offset += by;
        }

        /// Jump to an absolute offset from the origin
        pub fn set(&self, at: Duration) {
            let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
            *offset = at;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            let offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
            self.origin + *offset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance(Duration::from_secs(5));
        assert_eq!(clock.now() - start, Duration::from_secs(5));

        handle.set(Duration::from_secs(31));
        assert_eq!(clock.now() - start, Duration::from_secs(31));
    }
}
