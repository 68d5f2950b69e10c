use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::MonitorConfig;

/// Full-screen live heart rate from a Bluetooth LE sensor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connect to this sensor address on startup, e.g. A0:9E:1A:E0:4C:A3
    #[arg(short, long)]
    pub device: Option<String>,

    /// Seconds a scan listens for devices
    #[arg(long, default_value_t = 10)]
    pub scan_timeout: u64,

    /// Seconds to wait for a sensor to accept the connection
    #[arg(long, default_value_t = 15)]
    pub connect_timeout: u64,

    /// Use simulated sensors instead of the Bluetooth adapter
    #[arg(long)]
    pub simulate: bool,

    /// Start in a normal window instead of full screen
    #[arg(long)]
    pub windowed: bool,

    /// Append log lines to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> MonitorConfig {
        MonitorConfig::new()
            .with_scan_timeout(Duration::from_secs(self.scan_timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_device_address(self.device)
            .with_simulate(self.simulate)
            .with_fullscreen(!self.windowed)
            .with_log_file(self.log_file)
            .with_verbose(self.verbose)
    }
}
