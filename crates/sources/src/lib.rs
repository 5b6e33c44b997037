//! remote-sens-sources: Plex and Proxmox metric sources.

mod format;
mod payload;
mod plex;
mod polled;
mod proxmox;

pub use format::{
    format_count, format_duration, format_megabytes, format_percentage, MetricKind,
    NO_VALUE_TEXT,
};
pub use plex::{plex_source, PlexMetric};
pub use polled::{PolledSource, Sampler};
pub use proxmox::{proxmox_source, ProxmoxMetric};

use log::{debug, warn};
use remote_sens_core::{global_registry, BackendFamily, Registry};

/// Register all built-in sources with the global registry
pub fn register_all() {
    let mut registry = global_registry().write().unwrap_or_else(|poisoned| {
        warn!("Source registry lock was poisoned, recovering");
        poisoned.into_inner()
    });
    register_into(&mut registry);
}

/// Register all built-in sources with `registry`
pub fn register_into(registry: &mut Registry) {
    registry.register_source(
        PlexMetric::Streams.source_id(),
        PlexMetric::Streams.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Streams, config),
    );
    registry.register_source(
        PlexMetric::Movies.source_id(),
        PlexMetric::Movies.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Movies, config),
    );
    registry.register_source(
        PlexMetric::Shows.source_id(),
        PlexMetric::Shows.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Shows, config),
    );
    registry.register_source(
        PlexMetric::Episodes.source_id(),
        PlexMetric::Episodes.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Episodes, config),
    );
    registry.register_source(
        PlexMetric::Albums.source_id(),
        PlexMetric::Albums.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Albums, config),
    );
    registry.register_source(
        PlexMetric::Songs.source_id(),
        PlexMetric::Songs.name(),
        BackendFamily::Plex,
        |config| plex::boxed(PlexMetric::Songs, config),
    );

    registry.register_source(
        ProxmoxMetric::NodeCpu.source_id(),
        ProxmoxMetric::NodeCpu.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::NodeCpu, config),
    );
    registry.register_source(
        ProxmoxMetric::NodeMemory.source_id(),
        ProxmoxMetric::NodeMemory.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::NodeMemory, config),
    );
    registry.register_source(
        ProxmoxMetric::NodeDisk.source_id(),
        ProxmoxMetric::NodeDisk.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::NodeDisk, config),
    );
    registry.register_source(
        ProxmoxMetric::NodeUptime.source_id(),
        ProxmoxMetric::NodeUptime.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::NodeUptime, config),
    );
    registry.register_source(
        ProxmoxMetric::NodeNetwork.source_id(),
        ProxmoxMetric::NodeNetwork.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::NodeNetwork, config),
    );
    registry.register_source(
        ProxmoxMetric::VmCount.source_id(),
        ProxmoxMetric::VmCount.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::VmCount, config),
    );
    registry.register_source(
        ProxmoxMetric::LxcCount.source_id(),
        ProxmoxMetric::LxcCount.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::LxcCount, config),
    );
    registry.register_source(
        ProxmoxMetric::VmCpu.source_id(),
        ProxmoxMetric::VmCpu.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::VmCpu, config),
    );
    registry.register_source(
        ProxmoxMetric::VmMemory.source_id(),
        ProxmoxMetric::VmMemory.name(),
        BackendFamily::Proxmox,
        |config| proxmox::boxed(ProxmoxMetric::VmMemory, config),
    );

    debug!(
        "Registered {} Plex and {} Proxmox sources",
        PlexMetric::ALL.len(),
        ProxmoxMetric::ALL.len()
    );
}
