//! remote-sens-core: Core traits and plumbing for remote metric sources.
//!
//! This crate contains the `MetricSource` trait, the TTL cache and history
//! buffer every source shares, the HTTP transport, configuration resolution,
//! and the global source registry.

pub mod clock;
pub mod config;
pub mod constants;
mod history;
mod metric_source;
mod registry;
pub mod transport;
mod ttl_cache;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigDocument, ConfigError};
pub use constants::{
    BYTES_PER_MB, FAILURE_SENTINEL, HISTORY_CAPACITY, HISTORY_WINDOW, REQUEST_TIMEOUT,
};
pub use history::HistoryBuffer;
pub use metric_source::{BoxedMetricSource, MetricSource, SourceMetadata};
pub use registry::{global_registry, Registry, SourceFactory, SourceInfo};
pub use transport::{BoxedTransport, HttpTransport, Transport, Unavailable};
pub use ttl_cache::{CacheEntry, TtlCache};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "test-utils"))]
pub use transport::ScriptedTransport;

// Re-export types used in trait signatures for convenience
pub use remote_sens_types::{
    BackendConfig, BackendFamily, BackendSection, Credentials, FailurePolicy, HistoryMode,
};
