//! Proxmox VE node and guest sensors

use crate::format::MetricKind;
use crate::payload::{array_len, field, number, ratio_percent, sum_fields};
use crate::polled::{PolledSource, Sampler};
use remote_sens_core::{
    BackendConfig, BackendFamily, BoxedMetricSource, SourceMetadata, Transport, Unavailable,
};
use serde_json::Value;

/// Quantities reported by a Proxmox node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxmoxMetric {
    NodeCpu,
    NodeMemory,
    NodeDisk,
    NodeUptime,
    NodeNetwork,
    VmCount,
    LxcCount,
    VmCpu,
    VmMemory,
}

impl ProxmoxMetric {
    pub const ALL: [ProxmoxMetric; 9] = [
        ProxmoxMetric::NodeCpu,
        ProxmoxMetric::NodeMemory,
        ProxmoxMetric::NodeDisk,
        ProxmoxMetric::NodeUptime,
        ProxmoxMetric::NodeNetwork,
        ProxmoxMetric::VmCount,
        ProxmoxMetric::LxcCount,
        ProxmoxMetric::VmCpu,
        ProxmoxMetric::VmMemory,
    ];

    pub fn source_id(&self) -> &'static str {
        match self {
            ProxmoxMetric::NodeCpu => "proxmox_node_cpu",
            ProxmoxMetric::NodeMemory => "proxmox_node_memory",
            ProxmoxMetric::NodeDisk => "proxmox_node_disk",
            ProxmoxMetric::NodeUptime => "proxmox_node_uptime",
            ProxmoxMetric::NodeNetwork => "proxmox_node_network",
            ProxmoxMetric::VmCount => "proxmox_vm_count",
            ProxmoxMetric::LxcCount => "proxmox_lxc_count",
            ProxmoxMetric::VmCpu => "proxmox_vm_cpu",
            ProxmoxMetric::VmMemory => "proxmox_vm_memory",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProxmoxMetric::NodeCpu => "Proxmox Node CPU",
            ProxmoxMetric::NodeMemory => "Proxmox Node Memory",
            ProxmoxMetric::NodeDisk => "Proxmox Node Disk",
            ProxmoxMetric::NodeUptime => "Proxmox Node Uptime",
            ProxmoxMetric::NodeNetwork => "Proxmox Node Traffic",
            ProxmoxMetric::VmCount => "Proxmox VM Count",
            ProxmoxMetric::LxcCount => "Proxmox LXC Count",
            ProxmoxMetric::VmCpu => "Proxmox VM CPU",
            ProxmoxMetric::VmMemory => "Proxmox VM Memory",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ProxmoxMetric::NodeCpu => "Node CPU load in percent",
            ProxmoxMetric::NodeMemory => "Node memory used in percent",
            ProxmoxMetric::NodeDisk => "Node root filesystem used in percent",
            ProxmoxMetric::NodeUptime => "Node uptime in hours",
            ProxmoxMetric::NodeNetwork => "Bytes in and out over all node interfaces, in MB",
            ProxmoxMetric::VmCount => "QEMU virtual machines on the node",
            ProxmoxMetric::LxcCount => "LXC containers on the node",
            ProxmoxMetric::VmCpu => "CPU load of one VM in percent",
            ProxmoxMetric::VmMemory => "Memory used by one VM in percent",
        }
    }

    /// Whether the metric targets a single guest (`vm_id`)
    pub fn is_per_vm(&self) -> bool {
        matches!(self, ProxmoxMetric::VmCpu | ProxmoxMetric::VmMemory)
    }

    pub fn cache_key(&self, node: &str, vm_id: u32) -> String {
        let prefix = match self {
            ProxmoxMetric::NodeCpu => "nodecpu",
            ProxmoxMetric::NodeMemory => "nodemem",
            ProxmoxMetric::NodeDisk => "nodedsk",
            ProxmoxMetric::NodeUptime => "nodeupt",
            ProxmoxMetric::NodeNetwork => "nodenet",
            ProxmoxMetric::VmCount => "vmcnt",
            ProxmoxMetric::LxcCount => "lxccnt",
            ProxmoxMetric::VmCpu => "vmcpu",
            ProxmoxMetric::VmMemory => "vmmem",
        };
        if self.is_per_vm() {
            format!("{}_{}_{}", prefix, node, vm_id)
        } else {
            format!("{}_{}", prefix, node)
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            ProxmoxMetric::NodeCpu
            | ProxmoxMetric::NodeMemory
            | ProxmoxMetric::NodeDisk
            | ProxmoxMetric::VmCpu
            | ProxmoxMetric::VmMemory => MetricKind::Percentage,
            ProxmoxMetric::NodeUptime => MetricKind::Duration,
            ProxmoxMetric::NodeNetwork => MetricKind::Traffic,
            ProxmoxMetric::VmCount => MetricKind::Count {
                singular: "VM",
                plural: "VMs",
            },
            ProxmoxMetric::LxcCount => MetricKind::Count {
                singular: "LXC",
                plural: "LXC",
            },
        }
    }

    /// API path relative to `/api2/json`
    pub fn path(&self, node: &str, vm_id: u32) -> String {
        match self {
            ProxmoxMetric::NodeCpu
            | ProxmoxMetric::NodeMemory
            | ProxmoxMetric::NodeDisk
            | ProxmoxMetric::NodeUptime => format!("/nodes/{}/status", node),
            ProxmoxMetric::NodeNetwork => format!("/nodes/{}/netstat", node),
            ProxmoxMetric::VmCount => format!("/nodes/{}/qemu", node),
            ProxmoxMetric::LxcCount => format!("/nodes/{}/lxc", node),
            ProxmoxMetric::VmCpu | ProxmoxMetric::VmMemory => {
                format!("/nodes/{}/qemu/{}/status/current", node, vm_id)
            }
        }
    }

    /// Reduce the unwrapped `data` payload to the raw cached value
    ///
    /// Percentages come out in percent, uptime in seconds and traffic in
    /// bytes.
    pub fn transform(&self, data: &Value) -> f64 {
        match self {
            ProxmoxMetric::NodeCpu | ProxmoxMetric::VmCpu => number(data.get("cpu")) * 100.0,
            ProxmoxMetric::NodeMemory => ratio_percent(
                number(field(data, &["memory", "used"])),
                number(field(data, &["memory", "total"])),
            ),
            ProxmoxMetric::NodeDisk => ratio_percent(
                number(field(data, &["rootfs", "used"])),
                number(field(data, &["rootfs", "total"])),
            ),
            ProxmoxMetric::NodeUptime => number(data.get("uptime")),
            ProxmoxMetric::NodeNetwork => sum_fields(Some(data), &["in", "out"]),
            ProxmoxMetric::VmCount | ProxmoxMetric::LxcCount => array_len(Some(data)),
            ProxmoxMetric::VmMemory => {
                ratio_percent(number(data.get("mem")), number(data.get("maxmem")))
            }
        }
    }

    pub fn sample(
        &self,
        transport: &dyn Transport,
        node: &str,
        vm_id: u32,
    ) -> Result<f64, Unavailable> {
        let payload = transport.fetch(&self.path(node, vm_id))?;
        let data = payload.get("data").unwrap_or(&Value::Null);
        Ok(self.transform(data))
    }
}

/// Build the Proxmox source for `metric` on the configured node
pub fn proxmox_source(metric: ProxmoxMetric, config: &BackendConfig) -> PolledSource {
    PolledSource::new(
        metadata(metric, config),
        metric.cache_key(&config.node, config.vm_id),
        metric.kind(),
        config,
        sampler(metric, config),
    )
}

pub(crate) fn metadata(metric: ProxmoxMetric, config: &BackendConfig) -> SourceMetadata {
    let name = if metric.is_per_vm() {
        format!("{} ({}/{})", metric.name(), config.node, config.vm_id)
    } else {
        format!("{} ({})", metric.name(), config.node)
    };
    SourceMetadata {
        id: metric.source_id().to_string(),
        name,
        description: metric.description().to_string(),
        family: BackendFamily::Proxmox,
        default_interval: config.ttl(),
    }
}

pub(crate) fn sampler(metric: ProxmoxMetric, config: &BackendConfig) -> Sampler {
    let node = config.node.clone();
    let vm_id = config.vm_id;
    Box::new(move |transport: &dyn Transport| metric.sample(transport, &node, vm_id))
}

pub(crate) fn boxed(metric: ProxmoxMetric, config: &BackendConfig) -> BoxedMetricSource {
    Box::new(proxmox_source(metric, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_sens_core::{BYTES_PER_MB, MetricSource, ScriptedTransport};
    use serde_json::json;

    fn config() -> BackendConfig {
        let mut config = BackendConfig::unconfigured(BackendFamily::Proxmox);
        config.base_url = "https://pve.local:8006/api2/json".to_string();
        config.vm_id = 101;
        config
    }

    fn source(metric: ProxmoxMetric, transport: &ScriptedTransport) -> PolledSource {
        let config = config();
        PolledSource::with_transport(
            metadata(metric, &config),
            metric.cache_key(&config.node, config.vm_id),
            metric.kind(),
            &config,
            Box::new(transport.clone()),
            sampler(metric, &config),
        )
    }

    fn node_status() -> Value {
        json!({"data": {
            "cpu": 0.125,
            "uptime": 90061,
            "memory": {"used": 4096, "total": 16384, "free": 12288},
            "rootfs": {"used": 30, "total": 120},
        }})
    }

    #[test]
    fn test_cache_keys() {
        assert_eq!(ProxmoxMetric::NodeCpu.cache_key("pve", 0), "nodecpu_pve");
        assert_eq!(ProxmoxMetric::LxcCount.cache_key("pve2", 7), "lxccnt_pve2");
        assert_eq!(ProxmoxMetric::VmMemory.cache_key("pve", 101), "vmmem_pve_101");
    }

    #[test]
    fn test_node_status_metrics() {
        let transport = ScriptedTransport::new();
        transport.respond("/nodes/pve/status", node_status());

        let mut cpu = source(ProxmoxMetric::NodeCpu, &transport);
        assert_eq!(cpu.as_numeric(), Some(12.5));
        assert_eq!(cpu.as_string(), "12.5 %");

        let mut memory = source(ProxmoxMetric::NodeMemory, &transport);
        assert_eq!(memory.as_numeric(), Some(25.0));

        let mut disk = source(ProxmoxMetric::NodeDisk, &transport);
        assert_eq!(disk.as_numeric(), Some(25.0));
    }

    #[test]
    fn test_uptime_hours_and_text() {
        let transport = ScriptedTransport::new();
        transport.respond("/nodes/pve/status", node_status());
        let mut uptime = source(ProxmoxMetric::NodeUptime, &transport);

        let hours = uptime.as_numeric().unwrap();
        assert!((hours - 25.016944).abs() < 1e-6);
        assert_eq!(uptime.as_string(), "1d 1h 1m");
    }

    #[test]
    fn test_network_traffic_sums_interfaces() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "/nodes/pve/netstat",
            json!({"data": [
                {"dev": "tap100i0", "vmid": "100", "in": BYTES_PER_MB, "out": BYTES_PER_MB},
                {"dev": "tap101i0", "vmid": "101", "in": "524288"},
            ]}),
        );
        let mut traffic = source(ProxmoxMetric::NodeNetwork, &transport);

        assert_eq!(traffic.as_numeric(), Some(2.5));
        assert_eq!(traffic.as_string(), "2.5 MB");
    }

    #[test]
    fn test_guest_counts() {
        let transport = ScriptedTransport::new();
        transport
            .respond("/nodes/pve/qemu", json!({"data": [{"vmid": 100}, {"vmid": 101}]}))
            .respond("/nodes/pve/lxc", json!({"data": [{"vmid": 200}]}));

        let mut vms = source(ProxmoxMetric::VmCount, &transport);
        assert_eq!(vms.as_numeric(), Some(2.0));
        assert_eq!(vms.as_string(), "2 VMs");

        let mut lxc = source(ProxmoxMetric::LxcCount, &transport);
        assert_eq!(lxc.as_numeric(), Some(1.0));
        assert_eq!(lxc.as_string(), "1 LXC");
    }

    #[test]
    fn test_vm_metrics_and_zero_total() {
        let transport = ScriptedTransport::new();
        transport.respond(
            "/nodes/pve/qemu/101/status/current",
            json!({"data": {"cpu": 0.5, "mem": 512, "maxmem": 0}}),
        );

        let mut cpu = source(ProxmoxMetric::VmCpu, &transport);
        assert_eq!(cpu.as_numeric(), Some(50.0));

        let mut memory = source(ProxmoxMetric::VmMemory, &transport);
        assert_eq!(memory.as_numeric(), Some(0.0));
    }

    #[test]
    fn test_missing_data_substitutes_zero() {
        let transport = ScriptedTransport::new();
        transport.respond("/nodes/pve/status", json!({"errors": {}}));

        let mut cpu = source(ProxmoxMetric::NodeCpu, &transport);
        assert_eq!(cpu.as_numeric(), Some(0.0));
        assert_eq!(cpu.as_string(), "0.0 %");
    }
}
