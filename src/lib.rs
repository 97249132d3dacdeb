pub mod config;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use error::{Error, Result};
pub use metrics::{
    get_cpu_stats, get_memory_stats, get_network_stats, get_os_stats, get_process_stats,
    get_stats, AveragingPeriod, CpuStats, MemoryStats, NetworkStats, OsStats, ProcessStats,
    Snapshot,
};
