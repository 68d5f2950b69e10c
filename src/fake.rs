use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::error::{MonitorError, Result};
use crate::transport::{BleLink, BleTransport, DeviceDescriptor, NotificationStream, HEART_RATE_MEASUREMENT_UUID};

const FAKE_INTERVAL: Duration = Duration::from_millis(800);


/// Stand-in sensors for running without Bluetooth hardware.
pub struct SimulatedTransport {
    devices: Vec<DeviceDescriptor>,
    interval: Duration,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        SimulatedTransport {
            devices: vec![
                DeviceDescriptor::new("5A:1D:00:00:00:01", "Simulated HRM A"),
                DeviceDescriptor::new("5A:1D:00:00:00:02", "Simulated HRM B"),
            ],
            interval: FAKE_INTERVAL,
        }
    }
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait::async_trait]
impl BleTransport for SimulatedTransport {
    async fn discover(&self, timeout: Duration) -> Result<Vec<DeviceDescriptor>> {
        // pretend to scan, but don't keep the user waiting the full timeout
        tokio::time::sleep(timeout.min(Duration::from_secs(1))).await;
        Ok(self.devices.clone())
    }

    async fn open(&self, address: &str) -> Result<Box<dyn BleLink>> {
        if !self.devices.iter().any(|d| d.address.eq_ignore_ascii_case(address)) {
            return Err(MonitorError::ConnectionError(format!("peripheral {address} not found")));
        }
        info!("Simulated connection to {address}");
        Ok(Box::new(SimulatedLink {
            interval: self.interval,
            connected: Arc::new(AtomicBool::new(true)),
        }))
    }
}


struct SimulatedLink {
    interval: Duration,
    connected: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl BleLink for SimulatedLink {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream> {
        if characteristic != HEART_RATE_MEASUREMENT_UUID {
            return Err(MonitorError::ConnectionError(format!("characteristic {characteristic} not found")));
        }

        let interval = self.interval;
        let connected = self.connected.clone();
        let fake_hr = stream::unfold((), move |()| {
            let connected = connected.clone();
            async move {
                tokio::time::sleep(interval).await;
                if !connected.load(Ordering::Acquire) {
                    return None;
                }
                let random: u8 = rand::thread_rng().gen_range(50..70);
                Some((vec![0x00, random], ()))
            }
        });
        Ok(Box::pin(fake_hr))
    }

    async fn is_connected(&self) -> Result<bool> {
        Ok(self.connected.load(Ordering::Acquire))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}
