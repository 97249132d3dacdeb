//! Network stats: per-interface counters and throughput over a window.

use serde::{Deserialize, Serialize};
use sysinfo::Networks;
use tokio::task;
use tracing::debug;

use super::window_duration;
use crate::error::Result;

/// Network stats for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Per-interface counters, sorted by interface name
    pub interfaces: Vec<InterfaceStats>,
    /// Throughput measured over the sampling window, summed across interfaces
    pub in_out: ThroughputStats,
}

/// Cumulative counters for one network interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceStats {
    pub name: String,
    pub mac: String,
    /// Addresses in CIDR notation
    pub ips: Vec<String>,
    pub total_received_bytes: u64,
    pub total_transmitted_bytes: u64,
    pub total_packets_received: u64,
    pub total_packets_transmitted: u64,
    pub total_errors_received: u64,
    pub total_errors_transmitted: u64,
}

/// Bytes moved during the sampling window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputStats {
    pub window_ms: u64,
    pub received_bytes: u64,
    pub transmitted_bytes: u64,
    pub received_bytes_per_sec: f64,
    pub transmitted_bytes_per_sec: f64,
}

impl ThroughputStats {
    fn from_deltas(received_bytes: u64, transmitted_bytes: u64, window_ms: u64) -> Self {
        let window_secs = window_ms as f64 / 1000.0;
        Self {
            window_ms,
            received_bytes,
            transmitted_bytes,
            received_bytes_per_sec: received_bytes as f64 / window_secs,
            transmitted_bytes_per_sec: transmitted_bytes as f64 / window_secs,
        }
    }
}

/// Collects network stats, measuring in/out throughput over `window_ms`.
pub async fn get_network_stats(window_ms: u64) -> Result<NetworkStats> {
    let window = window_duration(window_ms)?;

    let mut networks = task::spawn_blocking(Networks::new_with_refreshed_list).await?;
    tokio::time::sleep(window).await;
    let networks = task::spawn_blocking(move || {
        networks.refresh();
        networks
    })
    .await?;

    let mut interfaces = Vec::new();
    let mut received = 0u64;
    let mut transmitted = 0u64;
    for (name, data) in &networks {
        received += data.received();
        transmitted += data.transmitted();
        interfaces.push(InterfaceStats {
            name: name.clone(),
            mac: data.mac_address().to_string(),
            ips: data
                .ip_networks()
                .iter()
                .map(|ip| format!("{}/{}", ip.addr, ip.prefix))
                .collect(),
            total_received_bytes: data.total_received(),
            total_transmitted_bytes: data.total_transmitted(),
            total_packets_received: data.total_packets_received(),
            total_packets_transmitted: data.total_packets_transmitted(),
            total_errors_received: data.total_errors_on_received(),
            total_errors_transmitted: data.total_errors_on_transmitted(),
        });
    }
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(interfaces = interfaces.len(), received, transmitted, "network stats collected");

    Ok(NetworkStats {
        interfaces,
        in_out: ThroughputStats::from_deltas(received, transmitted, window_ms),
    })
}
