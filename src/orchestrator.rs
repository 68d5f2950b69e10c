use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::Sender as TokioSender;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::bridge::HeartRateBridge;
use crate::error::Result;
use crate::screen::Screen;
use crate::session::{run_session, SessionManager};
use crate::signal::MonitorSignal;
use crate::transport::DeviceDescriptor;

struct Worker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Worker {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Hands the devices to the screen as selectable actions.
pub fn present(devices: &[DeviceDescriptor], screen: &mut dyn Screen) {
    screen.present_devices(devices);
}

/// Outlives the orchestrator so the host can wait for its workers to finish.
#[derive(Clone)]
pub struct ShutdownHandle {
    root: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownHandle {
    /// Cancels every worker and waits up to `grace` for open sessions to
    /// disconnect. Returns false if a worker was still running at the deadline.
    pub async fn wait(self, grace: Duration) -> bool {
        self.root.cancel();
        self.tracker.close();
        match timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!("{} worker(s) still running after {}ms", self.tracker.len(), grace.as_millis());
                false
            }
        }
    }
}

/// Owns the background scan and session workers.
///
/// Called from the UI thread; all BLE work is spawned onto `runtime`. At most
/// one session worker exists: selecting a device cancels the previous one and
/// the new worker waits for it to disconnect before it connects.
pub struct Orchestrator {
    runtime: Handle,
    manager: SessionManager,
    bridge: HeartRateBridge,
    tx_to_gui: TokioSender<MonitorSignal>,
    scan_timeout: Duration,
    root: CancellationToken,
    tracker: TaskTracker,
    scan: Option<Worker>,
    session: Option<Worker>,
    last_device: Option<DeviceDescriptor>,
}

impl Orchestrator {
    pub fn new(
        runtime: Handle,
        manager: SessionManager,
        bridge: HeartRateBridge,
        tx_to_gui: TokioSender<MonitorSignal>,
        scan_timeout: Duration,
    ) -> Self {
        Orchestrator {
            runtime,
            manager,
            bridge,
            tx_to_gui,
            scan_timeout,
            root: CancellationToken::new(),
            tracker: TaskTracker::new(),
            scan: None,
            session: None,
            last_device: None,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            root: self.root.clone(),
            tracker: self.tracker.clone(),
        }
    }

    pub async fn scan(&self, timeout: Duration) -> Result<Vec<DeviceDescriptor>> {
        scan(&self.manager, timeout).await
    }

    pub fn is_scanning(&self) -> bool {
        self.scan.as_ref().is_some_and(Worker::is_running)
    }

    pub fn has_session(&self) -> bool {
        self.session.as_ref().is_some_and(Worker::is_running)
    }

    pub fn last_device(&self) -> Option<&DeviceDescriptor> {
        self.last_device.as_ref()
    }

    /// Runs one discovery pass in the background. A listening session is left alone.
    pub fn start_scan(&mut self) {
        if let Some(previous) = self.scan.take() {
            previous.cancel.cancel();
        }

        let cancel = self.root.child_token();
        let manager = self.manager.clone();
        let tx_to_gui = self.tx_to_gui.clone();
        let scan_timeout = self.scan_timeout;
        let token = cancel.clone();

        let worker = async move {
            let _ = tx_to_gui.send(MonitorSignal::ScanStarted).await;

            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = scan(&manager, scan_timeout) => result,
            };

            let signal = match result {
                Ok(devices) if devices.is_empty() => MonitorSignal::NoDevicesFound,
                Ok(devices) => MonitorSignal::DevicesFound(devices),
                Err(err) => {
                    error!("{err}");
                    MonitorSignal::ScanFailed(err)
                }
            };
            let _ = tx_to_gui.send(signal).await;
        };

        let task = self.tracker.spawn_on(worker, &self.runtime);
        self.scan = Some(Worker { cancel, task });
    }

    /// Starts listening to `device`, closing the current session first.
    pub fn on_select(&mut self, device: DeviceDescriptor) {
        let previous = self.session.take();
        if let Some(previous) = &previous {
            previous.cancel.cancel();
        }

        info!("Selected {device}");
        self.last_device = Some(device.clone());

        let cancel = self.root.child_token();
        let manager = self.manager.clone();
        let bridge = self.bridge.clone();
        let tx_to_gui = self.tx_to_gui.clone();
        let token = cancel.clone();

        let worker = async move {
            if let Some(previous) = previous {
                let _ = previous.task.await;
            }
            run_session(manager, device, bridge, tx_to_gui, token).await;
        };

        let task = self.tracker.spawn_on(worker, &self.runtime);

        self.session = Some(Worker { cancel, task });
    }

    /// Connects to a known address without scanning first.
    pub fn connect_to(&mut self, address: &str) {
        self.on_select(DeviceDescriptor::from_address(address));
    }

    /// Manual retry with the most recently selected device.
    pub fn reconnect(&mut self) -> bool {
        let Some(device) = self.last_device.clone() else { return false; };
        self.on_select(device);
        true
    }

    pub fn disconnect(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }

    /// Cancels all workers. Sessions still disconnect in the background;
    /// use [`ShutdownHandle::wait`] to wait for that.
    pub fn shutdown(&mut self) {
        self.scan = None;
        self.session = None;
        self.root.cancel();
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn scan(manager: &SessionManager, timeout: Duration) -> Result<Vec<DeviceDescriptor>> {
    info!("Scanning for {}s...", timeout.as_secs());
    let devices = manager.transport().discover(timeout).await?;
    info!("Found {} device(s)", devices.len());
    for device in devices.iter() {
        info!("Device: {device}");
    }
    Ok(devices)
}
