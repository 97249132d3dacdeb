use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hostprobe_core::error::Error;
use hostprobe_core::metrics::{self, AveragingPeriod};

const WINDOW_MS: u64 = 500;

#[tokio::test(flavor = "multi_thread")]
async fn full_snapshot_populates_every_domain() {
    let started = Instant::now();
    let snapshot = metrics::get_stats(WINDOW_MS)
        .await
        .expect("snapshot should succeed on a supported host");
    let elapsed = started.elapsed();

    assert!(snapshot.cpu.count >= 1);
    assert!(snapshot.cpu.total_processes > 0);
    assert!(snapshot.mem.total_bytes > 0);
    assert!(!snapshot.os.hostname.is_empty());
    assert!(!snapshot.os.cores.is_empty());
    assert_eq!(snapshot.net.in_out.window_ms, WINDOW_MS);
    assert!(snapshot.proc.cpu_usage_percent >= 0.0);

    // The aggregate call is bounded by the slowest branch, not the sum of
    // the three windowed branches; a sequential fan-out would need at least
    // three windows.
    assert!(elapsed >= Duration::from_millis(WINDOW_MS));
    assert!(
        elapsed < Duration::from_millis(WINDOW_MS * 3),
        "branches appear to run sequentially: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn zero_window_fails_the_whole_snapshot() {
    let err = metrics::get_stats(0)
        .await
        .expect_err("zero window must be rejected");
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn process_stats_block_for_the_window() {
    let started = Instant::now();
    let stats = metrics::get_process_stats(200).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(stats.cpu_usage_percent >= 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn busy_process_measures_more_cpu_than_an_idle_one() {
    let idle = metrics::get_process_stats(300).await.unwrap().cpu_usage_percent;

    // Keep two cores spinning for the busy measurement.
    let stop = Arc::new(AtomicBool::new(false));
    let spinners: Vec<_> = (0..2)
        .map(|_| {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut acc = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    acc = acc.wrapping_add(1);
                }
                std::hint::black_box(acc);
            })
        })
        .collect();

    let busy = metrics::get_process_stats(300).await.unwrap().cpu_usage_percent;

    stop.store(true, Ordering::Relaxed);
    for spinner in spinners {
        spinner.join().unwrap();
    }

    assert!(
        busy > idle,
        "busy usage {} should exceed idle usage {}",
        busy,
        idle
    );
}

#[tokio::test]
async fn memory_totals_are_consistent() {
    let mem = metrics::get_memory_stats().await.unwrap();

    assert!(mem.total_bytes >= mem.free_bytes);
    assert_eq!(mem.used_bytes, mem.total_bytes - mem.free_bytes);
    assert!(mem.info.used_percent >= 0.0 && mem.info.used_percent <= 100.0);
    assert!(mem.info.free_percent >= 0.0 && mem.info.free_percent <= 100.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn domain_entry_points_return_their_slices() {
    let os = metrics::get_os_stats().await.unwrap();
    assert!(!os.hostname.is_empty());
    assert!(!os.cores.is_empty());
    assert!(os.file_descriptors.open > 0);
    assert!(!os.top_mem.is_empty());

    let cpu = metrics::get_cpu_stats(200, AveragingPeriod::One)
        .await
        .unwrap();
    assert!(cpu.count >= 1);
    assert_eq!(cpu.averaging_period_minutes, 1);
    assert!(cpu.total_processes > 0);

    let net = metrics::get_network_stats(200).await.unwrap();
    assert_eq!(net.in_out.window_ms, 200);

    let err = metrics::get_cpu_stats(0, AveragingPeriod::Five)
        .await
        .expect_err("zero window must be rejected per domain too");
    assert!(matches!(err, Error::Validation(_)));
}
