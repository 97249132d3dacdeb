//! Hostprobe binary.
//!
//! Collects one aggregated snapshot of OS, CPU, memory, network and process
//! metrics, prints it section by section and reports the elapsed wall time
//! for the whole call.

use clap::Parser;
use hostprobe_core::config::{Args, Settings};
use hostprobe_core::metrics;
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let settings = Settings::load(&args)?;
    info!(window_ms = settings.collector.window_ms, "collecting snapshot");

    let started = Instant::now();
    let snapshot = match metrics::get_stats(settings.collector.window_ms).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            error!("snapshot failed: {}", err);
            std::process::exit(1);
        }
    };
    let elapsed = started.elapsed();

    if settings.output.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        // Fixed section order, matching the snapshot's field order.
        section("os", &snapshot.os)?;
        section("cpu", &snapshot.cpu)?;
        section("mem", &snapshot.mem)?;
        section("net", &snapshot.net)?;
        section("proc", &snapshot.proc)?;
    }
    println!("elapsed: {:.3?}", elapsed);

    Ok(())
}

fn section<T: Serialize>(name: &str, value: &T) -> anyhow::Result<()> {
    println!(
        "#################### {} ####################",
        name.to_uppercase()
    );
    println!("{}\n", serde_json::to_string_pretty(value)?);
    Ok(())
}
