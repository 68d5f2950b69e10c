use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc::Sender as TokioSender;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bridge::HeartRateBridge;
use crate::error::{MonitorError, Result};
use crate::signal::MonitorSignal;
use crate::transport::{BleLink, BleTransport, DeviceDescriptor, NotificationStream, HEART_RATE_MEASUREMENT_UUID};

/// Receives every notification payload of a subscription, in arrival order.
pub trait NotificationHandler: Send {
    fn on_notification(&mut self, payload: &[u8]);
}

impl<F> NotificationHandler for F
where
    F: FnMut(&[u8]) + Send,
{
    fn on_notification(&mut self, payload: &[u8]) {
        self(payload)
    }
}

/// Why a keep-alive ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Cancelled,
}

/// Upper bound for a single subscribe, liveness check or disconnect.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn BleTransport>,
    keep_alive_interval: Duration,
    io_timeout: Duration,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn BleTransport>, keep_alive_interval: Duration) -> Self {
        SessionManager {
            transport,
            keep_alive_interval,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn transport(&self) -> &Arc<dyn BleTransport> {
        &self.transport
    }

    pub async fn connect(&self, device: &DeviceDescriptor) -> Result<Session> {
        info!("Connecting to {device}...");
        let link = self.transport.open(&device.address).await?;
        info!("Connected to {device}");

        Ok(Session {
            device: device.clone(),
            link,
            stream: None,
            handler: None,
            heartbeat: self.keep_alive_interval,
            io_timeout: self.io_timeout,
        })
    }
}

/// A live connection to one peripheral.
pub struct Session {
    device: DeviceDescriptor,
    link: Box<dyn BleLink>,
    stream: Option<NotificationStream>,
    handler: Option<Box<dyn NotificationHandler>>,
    heartbeat: Duration,
    io_timeout: Duration,
}

impl Session {
    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    pub async fn subscribe<H>(&mut self, characteristic: Uuid, handler: H) -> Result<()>
    where
        H: NotificationHandler + 'static,
    {
        let stream = timeout(self.io_timeout, self.link.subscribe(characteristic))
            .await
            .map_err(|_| {
                MonitorError::ConnectionError(format!(
                    "subscribing to {characteristic} timed out after {}s",
                    self.io_timeout.as_secs()
                ))
            })??;
        info!("Subscribed to {characteristic} on {}", self.device);
        self.stream = Some(stream);
        self.handler = Some(Box::new(handler));
        Ok(())
    }

    /// Delivers notifications until the peripheral goes away or `cancel` fires.
    ///
    /// Liveness is checked once per heartbeat instead of waiting for the
    /// transport to report the disconnect.
    pub async fn keep_alive(&mut self, cancel: &CancellationToken) -> Result<SessionEnd> {
        let Session { device, link, stream, handler, heartbeat, io_timeout } = self;

        let mut ticker = interval(*heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Session with {device} cancelled");
                    return Ok(SessionEnd::Cancelled);
                }

                payload = next_payload(stream) => {
                    let Some(payload) = payload else {
                        return Err(MonitorError::SessionLost("notification stream closed".to_string()));
                    };
                    if let Some(handler) = handler.as_mut() {
                        handler.on_notification(&payload);
                    }
                }

                _ = ticker.tick() => {
                    match timeout(*io_timeout, link.is_connected()).await {
                        Ok(Ok(true)) => {}
                        Ok(Ok(false)) => return Err(MonitorError::SessionLost(format!("{device} disconnected"))),
                        Ok(Err(err @ MonitorError::SessionLost(_))) => return Err(err),
                        Ok(Err(err)) => return Err(MonitorError::SessionLost(err.to_string())),
                        Err(_) => return Err(MonitorError::SessionLost(format!("{device} stopped answering"))),
                    }
                }
            }
        }
    }

    pub async fn close(mut self) {
        info!("Disconnecting from {}...", self.device);
        self.stream = None;
        match timeout(self.io_timeout, self.link.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("Disconnect from {} failed: {}", self.device, err),
            Err(_) => warn!("Disconnect from {} timed out", self.device),
        }
    }
}

async fn next_payload(stream: &mut Option<NotificationStream>) -> Option<Vec<u8>> {
    match stream {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

/// Connect, subscribe to the heart rate measurement and listen until lost or
/// cancelled. Every failure ends here as a signal.
pub async fn run_session(
    manager: SessionManager,
    device: DeviceDescriptor,
    bridge: HeartRateBridge,
    tx_to_gui: TokioSender<MonitorSignal>,
    cancel: CancellationToken,
) {
    let _ = tx_to_gui.send(MonitorSignal::Connecting(device.clone())).await;

    let connected = tokio::select! {
        _ = cancel.cancelled() => {
            let _ = tx_to_gui.send(MonitorSignal::Disconnected(device.clone())).await;
            return;
        }
        connected = manager.connect(&device) => connected,
    };

    let mut session = match connected {
        Ok(session) => session,
        Err(err) => {
            error!("Error connecting to {device}: {err}");
            let _ = tx_to_gui.send(MonitorSignal::ConnectionFailed(err)).await;
            return;
        }
    };

    let subscribed = tokio::select! {
        _ = cancel.cancelled() => None,
        subscribed = session.subscribe(HEART_RATE_MEASUREMENT_UUID, bridge.writer()) => Some(subscribed),
    };

    match subscribed {
        None => {
            session.close().await;
            let _ = tx_to_gui.send(MonitorSignal::Disconnected(device)).await;
            return;
        }
        Some(Err(err)) => {
            error!("Subscribing to {device} failed: {err}");
            session.close().await;
            let _ = tx_to_gui.send(MonitorSignal::ConnectionFailed(err)).await;
            return;
        }
        Some(Ok(())) => {}
    }

    let _ = tx_to_gui.send(MonitorSignal::Listening(device.clone())).await;

    let outcome = session.keep_alive(&cancel).await;
    session.close().await;

    let signal = match outcome {
        Ok(SessionEnd::Cancelled) => MonitorSignal::Disconnected(device),
        Err(err) => {
            error!("{err}");
            MonitorSignal::SessionLost(err)
        }
    };
    let _ = tx_to_gui.send(signal).await;
}
