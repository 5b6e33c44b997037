//! Shared constants for metric sources

use std::time::Duration;

/// Hard upper bound for a single backend request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(6);

/// Maximum number of samples retained per source
pub const HISTORY_CAPACITY: usize = 200;

/// Number of recent samples exposed for charting
pub const HISTORY_WINDOW: usize = 40;

/// Value stored when a fetch fails under the accept-on-failure policy
pub const FAILURE_SENTINEL: f64 = 0.0;

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3600;
pub const SECONDS_PER_DAY: u64 = 86_400;
