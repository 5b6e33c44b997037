//! Metric source trait and related types

use remote_sens_types::BackendFamily;
use std::time::Duration;

/// Metadata about a metric source
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    /// Unique identifier for this source type
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what this source provides
    pub description: String,
    /// Backend family the source polls
    pub family: BackendFamily,
    /// Recommended poll interval (the cache TTL; polling faster only hits the cache)
    pub default_interval: Duration,
}

/// Trait for all metric sources
///
/// A metric source polls one quantity from a remote API and exposes it
/// three ways: as a number for bars and graphs, as formatted text, and as
/// a short history for line charts. Hosts treat every source uniformly
/// through this trait.
pub trait MetricSource: Send + Sync {
    /// Get metadata about this source
    fn metadata(&self) -> &SourceMetadata;

    /// Fetch (through the cache) and return the numeric value
    ///
    /// Returns `None` only while no value has ever been recorded under the
    /// retain-last-good policy. Failures never propagate further than this.
    fn as_numeric(&mut self) -> Option<f64>;

    /// Format the currently cached value
    ///
    /// This never triggers a fetch, so calling it right after
    /// [`MetricSource::as_numeric`] describes the same value.
    fn as_string(&self) -> String;

    /// Recent numeric values, oldest first
    fn history(&self) -> Vec<f64>;

    /// Check if the backend behind this source is configured at all
    fn is_available(&self) -> bool {
        true
    }
}

/// Type-erased metric source for dynamic dispatch
pub type BoxedMetricSource = Box<dyn MetricSource>;
