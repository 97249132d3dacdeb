//! OS and platform information.
//!
//! The widest of the domain collectors: identity strings, addresses, file
//! descriptor pressure, per-core descriptors, top-process summaries and
//! virtual memory, each an independent leaf query joined at one point.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::net::IpAddr;
use sysinfo::{Networks, Process, ProcessesToUpdate, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::task;
use tracing::debug;

use super::cpu::LoadAverage;
use crate::error::{Error, Result};

/// How many processes the top-CPU and top-memory summaries keep.
const TOP_PROCESS_COUNT: usize = 5;

/// OS and platform information for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsStats {
    /// Pretty OS name, e.g. `Ubuntu 24.04.1 LTS`
    pub name: String,
    /// Kernel version
    pub kernel: String,
    /// Platform family, e.g. `linux`
    pub platform: String,
    /// CPU architecture, e.g. `x86_64`
    pub arch: String,
    /// Primary non-loopback IP address, if the host has one
    pub ip: Option<String>,
    pub hostname: String,
    /// Seconds since boot
    pub uptime_secs: u64,
    pub load_average: LoadAverage,
    pub file_descriptors: FileDescriptorStats,
    /// Per-core descriptors
    pub cores: Vec<CoreInfo>,
    /// Processes using the most CPU
    pub top_cpu: Vec<ProcessSummary>,
    /// Processes using the most memory
    pub top_mem: Vec<ProcessSummary>,
    pub virtual_memory: VirtualMemoryStats,
}

/// System-wide file descriptor pressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptorStats {
    /// File handles currently in use
    pub open: u64,
    /// System-wide maximum
    pub max: u64,
    /// Per-process soft limit for this process
    pub soft_limit: u64,
    /// Per-process hard limit for this process
    pub hard_limit: u64,
}

/// One logical core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreInfo {
    pub name: String,
    pub model: String,
    pub frequency_mhz: u64,
    pub usage_percent: f32,
}

/// One line of the top-CPU / top-memory process summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_bytes: u64,
}

/// Swap and availability, the virtual-memory side of the OS picture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMemoryStats {
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_free_bytes: u64,
    pub available_bytes: u64,
}

/// Collects OS and platform information.
pub async fn get_os_stats() -> Result<OsStats> {
    let (identity, cores, ip, file_descriptors, virtual_memory, (top_cpu, top_mem)) = tokio::try_join!(
        platform_identity(),
        core_descriptors(),
        primary_ip(),
        file_descriptor_stats(),
        virtual_memory(),
        top_processes(TOP_PROCESS_COUNT),
    )?;
    debug!(hostname = %identity.hostname, cores = cores.len(), "os stats collected");

    Ok(OsStats {
        name: identity.name,
        kernel: identity.kernel,
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        ip,
        hostname: identity.hostname,
        uptime_secs: identity.uptime_secs,
        load_average: identity.load_average,
        file_descriptors,
        cores,
        top_cpu,
        top_mem,
        virtual_memory,
    })
}

struct Identity {
    name: String,
    kernel: String,
    hostname: String,
    uptime_secs: u64,
    load_average: LoadAverage,
}

async fn platform_identity() -> Result<Identity> {
    task::spawn_blocking(|| {
        let hostname = System::host_name()
            .ok_or_else(|| Error::unavailable("hostname not reported by the provider"))?;
        Ok(Identity {
            name: System::long_os_version()
                .or_else(System::name)
                .unwrap_or_else(|| "unknown".to_string()),
            kernel: System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            hostname,
            uptime_secs: System::uptime(),
            load_average: LoadAverage::current(),
        })
    })
    .await?
}

/// Per-core usage needs two refreshes a provider-defined minimum apart.
async fn core_descriptors() -> Result<Vec<CoreInfo>> {
    let mut sys = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys
    })
    .await?;

    tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;

    let sys = task::spawn_blocking(move || {
        sys.refresh_cpu_usage();
        sys
    })
    .await?;

    Ok(sys
        .cpus()
        .iter()
        .map(|cpu| CoreInfo {
            name: cpu.name().to_string(),
            model: cpu.brand().trim().to_string(),
            frequency_mhz: cpu.frequency(),
            usage_percent: cpu.cpu_usage(),
        })
        .collect())
}

async fn primary_ip() -> Result<Option<String>> {
    let ip = task::spawn_blocking(|| {
        let networks = Networks::new_with_refreshed_list();
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();
        for (_name, data) in &networks {
            for ip in data.ip_networks() {
                match ip.addr {
                    IpAddr::V4(addr) if !addr.is_loopback() && !addr.is_link_local() => {
                        v4.push(addr.to_string())
                    }
                    IpAddr::V6(addr) if !addr.is_loopback() => v6.push(addr.to_string()),
                    _ => {}
                }
            }
        }
        // Interface iteration order is unstable; sort for a stable pick.
        v4.sort();
        v6.sort();
        v4.into_iter().next().or_else(|| v6.into_iter().next())
    })
    .await?;
    Ok(ip)
}

#[cfg(target_os = "linux")]
async fn file_descriptor_stats() -> Result<FileDescriptorStats> {
    task::spawn_blocking(|| {
        let raw = std::fs::read_to_string("/proc/sys/fs/file-nr")?;
        let fields: Vec<u64> = raw
            .split_whitespace()
            .filter_map(|field| field.parse().ok())
            .collect();
        // file-nr reports allocated handles, unused-but-allocated handles
        // and the system-wide maximum.
        let (allocated, unused, max) = match fields.as_slice() {
            [allocated, unused, max] => (*allocated, *unused, *max),
            _ => return Err(Error::unavailable("unexpected /proc/sys/fs/file-nr layout")),
        };
        let (soft_limit, hard_limit) = rlimit::Resource::NOFILE.get()?;
        Ok(FileDescriptorStats {
            open: allocated.saturating_sub(unused),
            max,
            soft_limit,
            hard_limit,
        })
    })
    .await?
}

#[cfg(not(target_os = "linux"))]
async fn file_descriptor_stats() -> Result<FileDescriptorStats> {
    Err(Error::unavailable(
        "system-wide open file count requires /proc/sys/fs/file-nr",
    ))
}

async fn virtual_memory() -> Result<VirtualMemoryStats> {
    let stats = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_memory();
        VirtualMemoryStats {
            swap_total_bytes: sys.total_swap(),
            swap_used_bytes: sys.used_swap(),
            swap_free_bytes: sys.free_swap(),
            available_bytes: sys.available_memory(),
        }
    })
    .await?;
    Ok(stats)
}

/// Per-process CPU shares also need two refreshes bracketing a short pause.
async fn top_processes(count: usize) -> Result<(Vec<ProcessSummary>, Vec<ProcessSummary>)> {
    let mut sys = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        sys
    })
    .await?;

    tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;

    let sys = task::spawn_blocking(move || {
        sys.refresh_processes(ProcessesToUpdate::All, true);
        sys
    })
    .await?;

    let mut processes: Vec<&Process> = sys.processes().values().collect();

    processes.sort_by(|a, b| {
        b.cpu_usage()
            .partial_cmp(&a.cpu_usage())
            .unwrap_or(Ordering::Equal)
    });
    let top_cpu = processes.iter().take(count).copied().map(summarize).collect();

    processes.sort_by_key(|process| Reverse(process.memory()));
    let top_mem = processes.iter().take(count).copied().map(summarize).collect();

    Ok((top_cpu, top_mem))
}

fn summarize(process: &Process) -> ProcessSummary {
    ProcessSummary {
        pid: process.pid().as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        cpu_percent: process.cpu_usage(),
        memory_bytes: process.memory(),
    }
}
