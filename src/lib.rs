//! Live heart rate from a Bluetooth LE sensor on a full-screen display.
//!
//! Notifications from the Heart Rate Measurement characteristic are decoded
//! into a [`bridge::HeartRateBridge`] by the session worker, and a
//! [`refresh::RefreshLoop`] on the UI thread copies the latest value onto the
//! screen every 100 ms. The [`orchestrator::Orchestrator`] runs scans and
//! owns the one live session.

pub mod app;
pub mod ble;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod fake;
pub mod orchestrator;
pub mod refresh;
pub mod screen;
pub mod session;
pub mod signal;
pub mod state;
pub mod transport;
pub mod widget;

pub use bridge::HeartRateBridge;
pub use config::MonitorConfig;
pub use error::{MonitorError, Result};
pub use orchestrator::{Orchestrator, ShutdownHandle};
pub use transport::{BleLink, BleTransport, DeviceDescriptor};
