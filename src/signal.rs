use crate::error::MonitorError;
use crate::transport::DeviceDescriptor;

/// Sent from background workers to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorSignal {
    ScanStarted,
    DevicesFound(Vec<DeviceDescriptor>),
    NoDevicesFound,
    ScanFailed(MonitorError),
    Connecting(DeviceDescriptor),
    Listening(DeviceDescriptor),
    ConnectionFailed(MonitorError),
    SessionLost(MonitorError),
    /// Session ended on request.
    Disconnected(DeviceDescriptor),
}

/// What the user asked for on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiSignal {
    StartScanning,
    ConnectDevice(DeviceDescriptor),
    Reconnect,
    Disconnect,
}
