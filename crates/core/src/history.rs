//! Bounded sample history for time-series display

use crate::constants::HISTORY_CAPACITY;
use std::collections::VecDeque;

/// Ring buffer of numeric samples in push order
///
/// Once full, each push evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` samples (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// The last `min(n, len)` samples, oldest first
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HISTORY_WINDOW;

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut history = HistoryBuffer::new();
        for i in 0..250 {
            history.push(i as f64);
            assert!(history.len() <= HISTORY_CAPACITY);
        }
        assert_eq!(history.len(), 200);

        let expected: Vec<f64> = (210..250).map(|i| i as f64).collect();
        assert_eq!(history.recent(HISTORY_WINDOW), expected);
    }

    #[test]
    fn test_recent_shorter_than_window() {
        let mut history = HistoryBuffer::new();
        history.push(1.0);
        history.push(2.5);
        assert_eq!(history.recent(40), vec![1.0, 2.5]);
        // Reading is non-destructive
        assert_eq!(history.recent(40), vec![1.0, 2.5]);
        assert_eq!(history.recent(1), vec![2.5]);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut history = HistoryBuffer::with_capacity(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            history.push(v);
        }
        assert_eq!(history.recent(10), vec![2.0, 3.0, 4.0]);
        assert_eq!(history.latest(), Some(4.0));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = HistoryBuffer::with_capacity(0);
        history.push(7.0);
        history.push(8.0);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.recent(5), vec![8.0]);
    }
}
