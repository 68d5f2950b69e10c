use std::time::Duration;

use btleplug::api::{Central, CharPropFlags, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral as PlatformPeripheral};
use futures::{future, StreamExt};
use tokio::sync::OnceCell;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{MonitorError, Result};
use crate::transport::{
    BleLink, BleTransport, DeviceDescriptor, NotificationStream, HEART_RATE_SERVICE_UUID, UNKNOWN_DEVICE_NAME,
};

const LOOKUP_POLL: Duration = Duration::from_millis(500);


/// btleplug backed transport using the first adapter the platform reports.
pub struct BtleplugTransport {
    adapter: OnceCell<Adapter>,
    connect_timeout: Duration,
    lookup_timeout: Duration,
}

impl BtleplugTransport {
    /// `lookup_timeout` bounds the scan used to find a peripheral that was
    /// not seen by an earlier discovery pass.
    pub fn new(connect_timeout: Duration, lookup_timeout: Duration) -> Self {
        BtleplugTransport {
            adapter: OnceCell::new(),
            connect_timeout,
            lookup_timeout,
        }
    }

    async fn adapter(&self) -> std::result::Result<&Adapter, String> {
        self.adapter.get_or_try_init(first_adapter).await
    }

    async fn find(&self, adapter: &Adapter, address: &str) -> Result<PlatformPeripheral> {
        if let Some(peripheral) = find_known(adapter, address).await? {
            return Ok(peripheral);
        }

        info!("{address} has not been seen yet, scanning for it");
        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| MonitorError::ConnectionError(e.to_string()))?;

        let deadline = Instant::now() + self.lookup_timeout;
        let found = loop {
            if let Some(peripheral) = find_known(adapter, address).await? {
                break Some(peripheral);
            }
            if Instant::now() >= deadline {
                break None;
            }
            sleep(LOOKUP_POLL).await;
        };

        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop lookup scan: {err}");
        }

        found.ok_or_else(|| MonitorError::ConnectionError(format!("peripheral {address} not found")))
    }
}

async fn first_adapter() -> std::result::Result<Adapter, String> {
    let manager = Manager::new().await.map_err(|e| e.to_string())?;
    let adapter_list = manager.adapters().await.map_err(|e| e.to_string())?;

    for adapter in adapter_list.iter() {
        debug!("adapter: {}", adapter.adapter_info().await.unwrap_or("No name adapter".to_string()));
    }

    adapter_list
        .into_iter()
        .next()
        .ok_or_else(|| "No Bluetooth adapters found".to_string())
}

/// macOS hides the hardware address, fall back to the platform id there.
fn peripheral_address(peripheral: &PlatformPeripheral) -> String {
    let address = peripheral.address();
    if address.into_inner() == [0; 6] {
        format!("{:?}", peripheral.id())
    } else {
        address.to_string()
    }
}

/// Descriptor plus whether the peripheral advertises the heart rate service.
async fn describe(peripheral: &PlatformPeripheral) -> Option<(DeviceDescriptor, bool)> {
    let Ok(Some(properties)) = peripheral.properties().await else { return None; };
    let heart_rate = properties.services.contains(&HEART_RATE_SERVICE_UUID);
    let name = properties.local_name.unwrap_or(UNKNOWN_DEVICE_NAME.to_string());

    Some((DeviceDescriptor::new(peripheral_address(peripheral), name), heart_rate))
}

/// Heart rate service advertisers first, otherwise the adapter's order.
fn order_heart_rate_first(found: Vec<(DeviceDescriptor, bool)>) -> Vec<DeviceDescriptor> {
    let (mut devices, others): (Vec<_>, Vec<_>) = found.into_iter().partition(|(_, heart_rate)| *heart_rate);
    devices.extend(others);
    devices.into_iter().map(|(device, _)| device).collect()
}

/// Runs one btleplug call, giving up after `limit`.
async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T>
where
    F: std::future::Future<Output = std::result::Result<T, btleplug::Error>>,
{
    match timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(MonitorError::ConnectionError(err.to_string())),
        Err(_) => Err(MonitorError::ConnectionError(format!("{what} timed out after {}s", limit.as_secs()))),
    }
}

async fn find_known(adapter: &Adapter, address: &str) -> Result<Option<PlatformPeripheral>> {
    let peripherals = adapter
        .peripherals()
        .await
        .map_err(|e| MonitorError::ConnectionError(e.to_string()))?;

    Ok(peripherals
        .into_iter()
        .find(|p| peripheral_address(p).eq_ignore_ascii_case(address)))
}

#[async_trait::async_trait]
impl BleTransport for BtleplugTransport {
    async fn discover(&self, scan_time: Duration) -> Result<Vec<DeviceDescriptor>> {
        let adapter = self.adapter().await.map_err(MonitorError::ScanFailure)?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| MonitorError::ScanFailure(e.to_string()))?;

        sleep(scan_time).await;

        if let Err(err) = adapter.stop_scan().await {
            warn!("Failed to stop scan: {err}");
        }

        // may contain peripherals that are no longer around, connecting to those fails later
        let peripherals = adapter
            .peripherals()
            .await
            .map_err(|e| MonitorError::ScanFailure(e.to_string()))?;

        let mut found = vec![];
        for peripheral in peripherals.iter() {
            let Some((device, heart_rate)) = describe(peripheral).await else { continue; };
            debug!("Device: {device} heart rate service: {heart_rate}");
            found.push((device, heart_rate));
        }

        Ok(order_heart_rate_first(found))
    }

    async fn open(&self, address: &str) -> Result<Box<dyn BleLink>> {
        let adapter = self.adapter().await.map_err(MonitorError::ConnectionError)?;
        let peripheral = self.find(adapter, address).await?;

        let connected = peripheral
            .is_connected()
            .await
            .map_err(|e| MonitorError::ConnectionError(e.to_string()))?;

        if !connected {
            match timeout(self.connect_timeout, peripheral.connect()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(MonitorError::ConnectionError(err.to_string())),
                Err(_) => {
                    return Err(MonitorError::ConnectionError(format!(
                        "no answer from {address} within {}s",
                        self.connect_timeout.as_secs()
                    )))
                }
            }
        }

        debug!("Discover peripheral {address} services...");
        bounded(self.connect_timeout, "service discovery", peripheral.discover_services()).await?;

        Ok(Box::new(BtleplugLink {
            peripheral,
            call_timeout: self.connect_timeout,
        }))
    }
}


struct BtleplugLink {
    peripheral: PlatformPeripheral,
    call_timeout: Duration,
}

#[async_trait::async_trait]
impl BleLink for BtleplugLink {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream> {
        let found = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic && c.properties.contains(CharPropFlags::NOTIFY));

        let Some(found) = found else {
            return Err(MonitorError::ConnectionError(format!(
                "characteristic {characteristic} not found or not notifying"
            )));
        };

        debug!("Subscribing to characteristic {} of service {}", found.uuid, found.service_uuid);
        bounded(self.call_timeout, "subscribe", self.peripheral.subscribe(&found)).await?;
        let notifications = bounded(self.call_timeout, "notifications", self.peripheral.notifications()).await?;

        Ok(Box::pin(
            notifications
                .filter(move |n| future::ready(n.uuid == characteristic))
                .map(|n| n.value),
        ))
    }

    async fn is_connected(&self) -> Result<bool> {
        bounded(self.call_timeout, "liveness check", self.peripheral.is_connected())
            .await
            .map_err(|e| MonitorError::SessionLost(e.to_string()))
    }

    async fn disconnect(&mut self) -> Result<()> {
        bounded(self.call_timeout, "disconnect", self.peripheral.disconnect())
            .await
            .map_err(|e| MonitorError::SessionLost(e.to_string()))
    }
}
