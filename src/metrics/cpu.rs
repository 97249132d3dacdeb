//! CPU stats: model, core counts, load averages and usage over a window.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::{ProcessStatus, ProcessesToUpdate, System};
use tokio::task;
use tracing::debug;

use super::window_duration;
use crate::error::{Error, Result};

/// Load-average window supported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingPeriod {
    /// One minute
    One,
    /// Five minutes
    Five,
    /// Fifteen minutes
    Fifteen,
}

impl AveragingPeriod {
    /// Maps a minute count onto a supported period.
    pub fn from_minutes(minutes: u64) -> Result<Self> {
        match minutes {
            1 => Ok(AveragingPeriod::One),
            5 => Ok(AveragingPeriod::Five),
            15 => Ok(AveragingPeriod::Fifteen),
            other => Err(Error::Validation(format!(
                "averaging period must be 1, 5 or 15 minutes, got {}",
                other
            ))),
        }
    }

    /// The period length in minutes.
    pub fn minutes(self) -> u64 {
        match self {
            AveragingPeriod::One => 1,
            AveragingPeriod::Five => 5,
            AveragingPeriod::Fifteen => 15,
        }
    }

    fn pick(self, load: LoadAverage) -> f64 {
        match self {
            AveragingPeriod::One => load.one,
            AveragingPeriod::Five => load.five,
            AveragingPeriod::Fifteen => load.fifteen,
        }
    }
}

impl Default for AveragingPeriod {
    fn default() -> Self {
        AveragingPeriod::Five
    }
}

/// System load averages over the standard 1/5/15 minute windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl LoadAverage {
    pub(crate) fn current() -> Self {
        let load = System::load_average();
        Self {
            one: load.one,
            five: load.five,
            fifteen: load.fifteen,
        }
    }
}

/// CPU stats for one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuStats {
    /// CPU model string
    pub model: String,
    /// Logical core count
    pub count: usize,
    /// Physical core count
    pub physical_count: usize,
    /// Instant load averages
    pub load_average: LoadAverage,
    /// Load average for the requested averaging period
    pub load_average_windowed: f64,
    /// The averaging period behind `load_average_windowed`, in minutes
    pub averaging_period_minutes: u64,
    /// Mean usage across cores at the end of the window, percent
    pub mean_usage_percent: f32,
    /// Overall usage measured over the sampling window, percent
    pub usage_percent: f32,
    /// Overall idle share over the sampling window, percent
    pub free_percent: f32,
    /// Total number of processes
    pub total_processes: usize,
    /// Number of zombie processes
    pub zombie_processes: usize,
}

/// Collects CPU stats, measuring usage over `window_ms`.
pub async fn get_cpu_stats(window_ms: u64, period: AveragingPeriod) -> Result<CpuStats> {
    let window = window_duration(window_ms)?;

    let ((model, usage_percent, mean_usage_percent), (total_processes, zombie_processes)) =
        tokio::try_join!(usage_sample(window), process_counts())?;

    let load_average = LoadAverage::current();
    debug!(usage_percent, total_processes, "cpu stats collected");

    Ok(CpuStats {
        model,
        count: num_cpus::get(),
        physical_count: num_cpus::get_physical(),
        load_average,
        load_average_windowed: period.pick(load_average),
        averaging_period_minutes: period.minutes(),
        mean_usage_percent,
        usage_percent,
        free_percent: (100.0 - usage_percent).max(0.0),
        total_processes,
        zombie_processes,
    })
}

/// Two-point usage sample: the provider computes usage as the delta between
/// consecutive refreshes, so the refreshes bracket the sampling window.
async fn usage_sample(window: Duration) -> Result<(String, f32, f32)> {
    let mut sys = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys
    })
    .await?;

    tokio::time::sleep(window).await;

    let sys = task::spawn_blocking(move || {
        sys.refresh_cpu_usage();
        sys
    })
    .await?;

    let model = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let mean = if sys.cpus().is_empty() {
        0.0
    } else {
        sys.cpus().iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / sys.cpus().len() as f32
    };

    Ok((model, sys.global_cpu_usage(), mean))
}

async fn process_counts() -> Result<(usize, usize)> {
    let counts = task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::All, true);
        let total = sys.processes().len();
        let zombies = sys
            .processes()
            .values()
            .filter(|process| matches!(process.status(), ProcessStatus::Zombie))
            .count();
        (total, zombies)
    })
    .await?;
    Ok(counts)
}
