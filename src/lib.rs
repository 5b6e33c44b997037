//! remote-sens: Polling metric sources for dashboards
//!
//! This library ties the workspace crates together:
//! - Metric sources for Plex and Proxmox (`remote-sens-sources`)
//! - Cache, history, transport and configuration (`remote-sens-core`)
//! - An update manager that polls sources on a schedule

pub mod core;

// Re-export commonly used types
pub use crate::core::{Reading, UpdateManager};
pub use remote_sens_core::{
    global_registry, BackendSection, BoxedMetricSource, ConfigDocument, MetricSource,
};
pub use remote_sens_sources::register_all;
