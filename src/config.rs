//! Configuration management for the hostprobe collector.
//!
//! Configuration is loaded from multiple sources, in order of precedence:
//! 1. Default configuration (embedded in the binary)
//! 2. System-wide configuration file (`/etc/hostprobe/config.toml`)
//! 3. User-specified configuration file
//! 4. Environment variables (prefixed with `HOSTPROBE_`)
//! 5. Command-line arguments

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Command-line arguments
#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Args {
    /// Configuration file path
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Sampling window in milliseconds for time-averaged metrics
    #[clap(long)]
    pub window_ms: Option<u64>,

    /// Print the snapshot as one JSON document
    #[clap(long)]
    pub json: bool,
}

/// Collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Snapshot collection settings
    pub collector: CollectorConfig,
    /// Output settings for the demo driver
    #[serde(default)]
    pub output: OutputConfig,
}

/// Snapshot collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Sampling window in milliseconds for time-averaged metrics
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

/// Output settings for the demo driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print the snapshot as one JSON document instead of sectioned text
    #[serde(default)]
    pub json: bool,
}

fn default_window_ms() -> u64 {
    1000
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name("/etc/hostprobe/config.toml").required(false));

        // Load user config if specified
        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        // Add environment variables
        builder = builder.add_source(config::Environment::with_prefix("HOSTPROBE"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        // Override with command line args
        if let Some(window_ms) = args.window_ms {
            settings.collector.window_ms = window_ms;
        }
        if args.json {
            settings.output.json = true;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults() {
        let args = Args::parse_from(["hostprobe"]);
        let settings = Settings::load(&args).unwrap();
        assert_eq!(settings.collector.window_ms, 1000);
        assert!(!settings.output.json);
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let file = config_file("[collector]\nwindow_ms = 250");

        let args = Args::parse_from([
            "hostprobe",
            "--config",
            file.path().to_str().unwrap(),
        ]);
        let settings = Settings::load(&args).unwrap();
        assert_eq!(settings.collector.window_ms, 250);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = config_file("[collector]\nwindow_ms = 250");

        let args = Args::parse_from([
            "hostprobe",
            "--config",
            file.path().to_str().unwrap(),
            "--window-ms",
            "50",
            "--json",
        ]);
        let settings = Settings::load(&args).unwrap();
        assert_eq!(settings.collector.window_ms, 50);
        assert!(settings.output.json);
    }
}
