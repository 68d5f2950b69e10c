use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use uuid::Uuid;

use crate::error::Result;

pub const HEART_RATE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000180d_0000_1000_8000_00805f9b34fb);
pub const HEART_RATE_MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);

pub const UNKNOWN_DEVICE_NAME: &str = "(unknown)";

/// Raw characteristic values in arrival order.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// A peripheral found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub address: String,
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        DeviceDescriptor {
            address: address.into(),
            name: name.into(),
        }
    }

    /// Descriptor for a device known only by its address.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self::new(address, UNKNOWN_DEVICE_NAME)
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// The BLE stack as seen by the session manager and the orchestrator.
#[async_trait::async_trait]
pub trait BleTransport: Send + Sync {
    /// One discovery pass. An empty result is not an error.
    async fn discover(&self, timeout: Duration) -> Result<Vec<DeviceDescriptor>>;

    /// Opens a connection to the peripheral with the given address.
    async fn open(&self, address: &str) -> Result<Box<dyn BleLink>>;
}

/// An open connection to a single peripheral.
#[async_trait::async_trait]
pub trait BleLink: Send + Sync {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream>;

    async fn is_connected(&self) -> Result<bool>;

    async fn disconnect(&mut self) -> Result<()>;
}
