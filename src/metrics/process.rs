//! Stats about the calling process itself.
//!
//! CPU usage is measured from two CPU-time samples bracketing the sampling
//! window. The wait is a suspending sleep on the runtime, never a busy poll.

use nix::sys::resource::{getrusage, UsageWho};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::task;
use tracing::debug;

use super::window_duration;
use crate::error::{Error, Result};

/// Stats for the calling process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStats {
    /// Seconds since the process started
    pub uptime_secs: u64,
    /// Resident memory in bytes
    pub memory_bytes: u64,
    /// CPU usage over the sampling window, percent. Can exceed 100 when the
    /// process keeps more than one core busy.
    pub cpu_usage_percent: f64,
}

/// Collects stats for the calling process, measuring its CPU usage over
/// `window_ms`.
pub async fn get_process_stats(window_ms: u64) -> Result<ProcessStats> {
    let window = window_duration(window_ms)?;

    let ((uptime_secs, memory_bytes), cpu_usage_percent) =
        tokio::try_join!(self_info(), self_cpu_usage(window, window_ms))?;
    debug!(uptime_secs, cpu_usage_percent, "process stats collected");

    Ok(ProcessStats {
        uptime_secs,
        memory_bytes,
        cpu_usage_percent,
    })
}

async fn self_cpu_usage(window: Duration, window_ms: u64) -> Result<f64> {
    let start = cpu_time_micros()?;
    tokio::time::sleep(window).await;
    let end = cpu_time_micros()?;
    Ok(cpu_usage_percent(end.saturating_sub(start), window_ms))
}

/// User + system CPU time consumed by this process so far, in microseconds.
fn cpu_time_micros() -> Result<u64> {
    let usage = getrusage(UsageWho::RUSAGE_SELF).map_err(Error::unavailable)?;
    let user = usage.user_time();
    let system = usage.system_time();
    let micros =
        (user.tv_sec() + system.tv_sec()) * 1_000_000 + user.tv_usec() + system.tv_usec();
    Ok(micros.max(0) as u64)
}

/// CPU time deltas are in microseconds, the wall window in milliseconds;
/// the factor of 1000 bridges the two units.
fn cpu_usage_percent(cpu_time_delta_micros: u64, window_ms: u64) -> f64 {
    (cpu_time_delta_micros as f64 / (window_ms as f64 * 1000.0)) * 100.0
}

async fn self_info() -> Result<(u64, u64)> {
    task::spawn_blocking(|| {
        let pid = sysinfo::get_current_pid().map_err(Error::unavailable)?;
        let mut sys = System::new();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );
        let process = sys
            .process(pid)
            .ok_or_else(|| Error::unavailable("current process not visible to the provider"))?;
        Ok((process.run_time(), process.memory()))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percent_unit_conversion() {
        // 500ms of CPU time over a 1000ms window is 50%.
        assert_eq!(cpu_usage_percent(500_000, 1000), 50.0);
        // A fully busy single core over any window is 100%.
        assert_eq!(cpu_usage_percent(250_000, 250), 100.0);
        assert_eq!(cpu_usage_percent(0, 1000), 0.0);
        // More CPU time than wall time means multiple busy cores.
        assert_eq!(cpu_usage_percent(2_000_000, 1000), 200.0);
    }

    #[test]
    fn test_cpu_time_is_monotonic() {
        let first = cpu_time_micros().unwrap();
        // Burn a little CPU so the second sample moves.
        let mut acc = 0u64;
        for i in 0..1_000_000u64 {
            acc = acc.wrapping_add(i);
        }
        std::hint::black_box(acc);
        let second = cpu_time_micros().unwrap();
        assert!(second >= first);
    }
}
