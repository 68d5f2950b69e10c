#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::channel::mpsc::{unbounded, UnboundedSender};
use tokio::sync::mpsc::Receiver;
use uuid::Uuid;

use hrscreen::signal::MonitorSignal;
use hrscreen::transport::NotificationStream;
use hrscreen::{BleLink, BleTransport, DeviceDescriptor, MonitorError, Result};

/// Handle a test uses to drive one opened link.
#[derive(Clone)]
pub struct LinkControl {
    pub notifications: UnboundedSender<Vec<u8>>,
    pub connected: Arc<AtomicBool>,
}

impl LinkControl {
    pub fn notify(&self, payload: &[u8]) {
        self.notifications.unbounded_send(payload.to_vec()).unwrap();
    }

    /// Ends the notification stream as if the transport went away.
    pub fn close_stream(&self) {
        self.notifications.close_channel();
    }

    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct Script {
    scan: Option<Result<Vec<DeviceDescriptor>>>,
    unreachable: Vec<String>,
    stalled_subscribe: Vec<String>,
    disconnect_delay: Duration,
    links: HashMap<String, LinkControl>,
    events: Vec<String>,
}

/// In-memory transport whose peripherals are driven by the test.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan_result(&self, result: Result<Vec<DeviceDescriptor>>) {
        self.script.lock().unwrap().scan = Some(result);
    }

    pub fn unreachable(&self, address: &str) {
        self.script.lock().unwrap().unreachable.push(address.to_string());
    }

    /// `subscribe` on this peripheral never answers.
    pub fn stall_subscribe(&self, address: &str) {
        self.script.lock().unwrap().stalled_subscribe.push(address.to_string());
    }

    /// How long a disconnect round trip takes.
    pub fn disconnect_delay(&self, delay: Duration) {
        self.script.lock().unwrap().disconnect_delay = delay;
    }

    pub fn link(&self, address: &str) -> LinkControl {
        self.script.lock().unwrap().links[address].clone()
    }

    /// open/subscribe/disconnect calls in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.script.lock().unwrap().events.clone()
    }

    fn record(&self, event: String) {
        self.script.lock().unwrap().events.push(event);
    }
}

#[async_trait::async_trait]
impl BleTransport for ScriptedTransport {
    async fn discover(&self, timeout: Duration) -> Result<Vec<DeviceDescriptor>> {
        tokio::time::sleep(timeout).await;
        self.script.lock().unwrap().scan.clone().unwrap_or(Ok(vec![]))
    }

    async fn open(&self, address: &str) -> Result<Box<dyn BleLink>> {
        self.record(format!("open {address}"));
        let mut script = self.script.lock().unwrap();
        if script.unreachable.iter().any(|a| a == address) {
            return Err(MonitorError::ConnectionError(format!("{address} unreachable")));
        }

        let (tx, rx) = unbounded();
        let connected = Arc::new(AtomicBool::new(true));
        script.links.insert(
            address.to_string(),
            LinkControl {
                notifications: tx,
                connected: connected.clone(),
            },
        );

        let stream: NotificationStream = Box::pin(rx);
        Ok(Box::new(ScriptedLink {
            address: address.to_string(),
            stream: Mutex::new(Some(stream)),
            connected,
            transport: self.clone(),
        }))
    }
}

struct ScriptedLink {
    address: String,
    stream: Mutex<Option<NotificationStream>>,
    connected: Arc<AtomicBool>,
    transport: ScriptedTransport,
}

#[async_trait::async_trait]
impl BleLink for ScriptedLink {
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream> {
        self.transport.record(format!("subscribe {}", self.address));
        let stalled = self.transport.script.lock().unwrap().stalled_subscribe.contains(&self.address);
        if stalled {
            futures::future::pending::<()>().await;
        }
        self.stream
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| MonitorError::ConnectionError(format!("{characteristic} already subscribed")))
    }

    async fn is_connected(&self) -> Result<bool> {
        Ok(self.connected.load(Ordering::Acquire))
    }

    async fn disconnect(&mut self) -> Result<()> {
        let delay = self.transport.script.lock().unwrap().disconnect_delay;
        tokio::time::sleep(delay).await;
        self.transport.record(format!("disconnect {}", self.address));
        self.connected.store(false, Ordering::Release);
        Ok(())
    }
}

pub async fn next_signal(rx: &mut Receiver<MonitorSignal>) -> MonitorSignal {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("no signal within 30s")
        .expect("signal channel closed")
}
