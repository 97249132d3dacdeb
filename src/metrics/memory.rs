//! Memory stats.

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tokio::task;

use crate::error::Result;

/// Memory stats for one snapshot. `used_bytes` is defined as
/// `total_bytes - free_bytes`, free meaning completely unused memory (not
/// reclaimable caches; those are reflected in `info.available_bytes`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
    /// Structured breakdown beyond the total/free/used triple
    pub info: MemoryInfo,
}

/// Structured memory breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInfo {
    /// Memory available for new allocations, including reclaimable caches
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub swap_free_bytes: u64,
    pub used_percent: f64,
    pub free_percent: f64,
}

/// Collects memory stats.
pub async fn get_memory_stats() -> Result<MemoryStats> {
    let sys = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_memory();
        sys
    })
    .await?;

    let total = sys.total_memory();
    let free = sys.free_memory();
    let used = total.saturating_sub(free);

    Ok(MemoryStats {
        total_bytes: total,
        free_bytes: free,
        used_bytes: used,
        info: MemoryInfo {
            available_bytes: sys.available_memory(),
            swap_total_bytes: sys.total_swap(),
            swap_used_bytes: sys.used_swap(),
            swap_free_bytes: sys.free_swap(),
            used_percent: percent(used, total),
            free_percent: percent(free, total),
        },
    })
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(200, 200), 100.0);
        assert_eq!(percent(1, 0), 0.0);
    }
}
