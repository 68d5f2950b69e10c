use std::path::PathBuf;
use std::time::Duration;

use crate::refresh::REFRESH_PERIOD;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// How long one discovery pass listens for advertisements.
    pub scan_timeout: Duration,
    pub connect_timeout: Duration,
    pub keep_alive_interval: Duration,
    pub refresh_period: Duration,
    /// Connect straight to this address on startup instead of waiting for a scan.
    pub device_address: Option<String>,
    pub simulate: bool,
    pub fullscreen: bool,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(15),
            keep_alive_interval: Duration::from_secs(1),
            refresh_period: REFRESH_PERIOD,
            device_address: None,
            simulate: false,
            fullscreen: true,
            log_file: None,
            verbose: false,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    pub fn with_device_address(mut self, address: Option<String>) -> Self {
        self.device_address = address;
        self
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
