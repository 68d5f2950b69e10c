use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use eframe::egui;
use tracing::{info, warn};

use hrscreen::app::HeartRateApp;
use hrscreen::ble::BtleplugTransport;
use hrscreen::cli::Cli;
use hrscreen::fake::SimulatedTransport;
use hrscreen::refresh::RefreshLoop;
use hrscreen::session::SessionManager;
use hrscreen::{BleTransport, HeartRateBridge, MonitorConfig, Orchestrator};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config();
    setup_logging(&config)?;

    let (tx, rx) = tokio::sync::mpsc::channel(128);
    let bridge = HeartRateBridge::new();

    let transport: Arc<dyn BleTransport> = if config.simulate {
        info!("Using simulated sensors");
        Arc::new(SimulatedTransport::new())
    } else {
        Arc::new(BtleplugTransport::new(config.connect_timeout, config.scan_timeout))
    };
    let manager =
        SessionManager::new(transport, config.keep_alive_interval).with_io_timeout(config.connect_timeout);

    let mut orchestrator = Orchestrator::new(
        tokio::runtime::Handle::current(),
        manager,
        bridge.clone(),
        tx,
        config.scan_timeout,
    );
    if let Some(address) = &config.device_address {
        orchestrator.connect_to(address);
    }
    let shutdown = orchestrator.shutdown_handle();
    let refresh = RefreshLoop::new(bridge, config.refresh_period);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Heart Rate Monitor")
            .with_fullscreen(config.fullscreen),
        ..Default::default()
    };
    let displayed = eframe::run_native(
        "hrscreen",
        native_options,
        Box::new(|cc| Ok(Box::new(HeartRateApp::new(cc, rx, orchestrator, refresh)))),
    )
    .map_err(|e| anyhow!("display failed: {e}"));

    info!("Display closed, disconnecting");
    if !shutdown.wait(SHUTDOWN_GRACE).await {
        warn!("Exiting with a session still open");
    }
    displayed
}

fn setup_logging(config: &MonitorConfig) -> Result<()> {
    let log_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("can't open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
