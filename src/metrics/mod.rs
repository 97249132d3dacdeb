//! Aggregated host metrics snapshots.
//!
//! This module issues a fixed set of independent metric-retrieval operations
//! concurrently, waits for all of them, and assembles their results into one
//! [`Snapshot`]. Every actual measurement is delegated to the OS metrics
//! provider ([`sysinfo`]) or to the host's own process introspection calls;
//! the logic here is fan-out and merge.
//!
//! ```no_run
//! use hostprobe_core::metrics;
//!
//! #[tokio::main]
//! async fn main() -> hostprobe_core::Result<()> {
//!     let snapshot = metrics::get_stats(1000).await?;
//!     println!("{} logical cores", snapshot.cpu.count);
//!     Ok(())
//! }
//! ```

mod cpu;
mod memory;
mod network;
mod os;
mod process;

pub use cpu::{get_cpu_stats, AveragingPeriod, CpuStats, LoadAverage};
pub use memory::{get_memory_stats, MemoryInfo, MemoryStats};
pub use network::{get_network_stats, InterfaceStats, NetworkStats, ThroughputStats};
pub use os::{
    get_os_stats, CoreInfo, FileDescriptorStats, OsStats, ProcessSummary, VirtualMemoryStats,
};
pub use process::{get_process_stats, ProcessStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// One complete aggregated result of all metric domains for a single call.
///
/// Produced fresh on every invocation and never mutated afterwards. All
/// fields are populated or the whole collection fails; no partial snapshot
/// is ever returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the collection started
    pub collected_at: DateTime<Utc>,
    /// OS and platform information
    pub os: OsStats,
    /// CPU load and usage
    pub cpu: CpuStats,
    /// Memory usage
    pub mem: MemoryStats,
    /// Network interfaces and throughput over the window
    pub net: NetworkStats,
    /// The calling process itself
    pub proc: ProcessStats,
}

/// Collects one aggregated snapshot of all metric domains.
///
/// The five domain collectors run as independent tasks; the call completes
/// when the slowest of them does, so the total wall time is bounded by the
/// sampling window plus provider overhead, not by the sum of the branches.
///
/// The first failing branch aborts the whole call and surfaces its cause.
/// Branches still in flight at that point are not cancelled; they run to
/// completion detached and their results are dropped. The same applies when
/// the returned future itself is dropped mid-collection.
///
/// The windowed load average inside [`CpuStats`] is fixed to the five-minute
/// window here; use [`get_cpu_stats`] directly to pick another period.
pub async fn get_stats(window_ms: u64) -> Result<Snapshot> {
    window_duration(window_ms)?;
    let collected_at = Utc::now();
    let started = Instant::now();
    debug!(window_ms, "collecting aggregated snapshot");

    let os = tokio::spawn(os::get_os_stats());
    let cpu = tokio::spawn(cpu::get_cpu_stats(window_ms, AveragingPeriod::Five));
    let mem = tokio::spawn(memory::get_memory_stats());
    let net = tokio::spawn(network::get_network_stats(window_ms));
    let proc = tokio::spawn(process::get_process_stats(window_ms));

    let (os, cpu, mem, net, proc) = tokio::try_join!(
        flatten(os),
        flatten(cpu),
        flatten(mem),
        flatten(net),
        flatten(proc),
    )?;

    debug!(elapsed_ms = started.elapsed().as_millis() as u64, "snapshot complete");
    Ok(Snapshot {
        collected_at,
        os,
        cpu,
        mem,
        net,
        proc,
    })
}

async fn flatten<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    match handle.await {
        Ok(result) => result,
        Err(err) => Err(Error::from(err)),
    }
}

/// Validates the caller-supplied sampling window.
pub(crate) fn window_duration(window_ms: u64) -> Result<Duration> {
    if window_ms == 0 {
        return Err(Error::Validation(
            "sampling window must be a positive number of milliseconds".to_string(),
        ));
    }
    Ok(Duration::from_millis(window_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_validation() {
        assert!(window_duration(0).is_err());
        assert_eq!(window_duration(250).unwrap(), Duration::from_millis(250));
    }
}
