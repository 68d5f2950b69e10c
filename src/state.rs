use crate::error::MonitorError;
use crate::orchestrator::present;
use crate::screen::Screen;
use crate::signal::MonitorSignal;
use crate::transport::DeviceDescriptor;

pub const NO_DEVICES_FOUND: &str = "No devices found. Make sure Bluetooth is on and the sensor is awake.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Presenting,
    Connecting(DeviceDescriptor),
    Listening(DeviceDescriptor),
    Error(MonitorError),
}

/// UI-side view of what the workers are doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    phase: Phase,
    /// Set while a session is streaming, independently of an ongoing scan.
    active_device: Option<DeviceDescriptor>,
}

impl Default for MonitorState {
    fn default() -> Self {
        MonitorState {
            phase: Phase::Idle,
            active_device: None,
        }
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.active_device.as_ref()
    }

    pub fn apply(&mut self, signal: MonitorSignal, screen: &mut dyn Screen) {
        match signal {
            MonitorSignal::ScanStarted => {
                present(&[], screen);
                screen.set_status("Scanning...");
                self.phase = Phase::Scanning;
            }
            MonitorSignal::DevicesFound(devices) => {
                present(&devices, screen);
                screen.set_status(&format!("Found {} device(s)", devices.len()));
                self.phase = Phase::Presenting;
            }
            MonitorSignal::NoDevicesFound => {
                screen.set_status(NO_DEVICES_FOUND);
                self.phase = Phase::Idle;
            }
            MonitorSignal::ScanFailed(err) => {
                screen.set_status(&err.to_string());
                self.phase = Phase::Error(err);
            }
            MonitorSignal::Connecting(device) => {
                screen.set_status(&format!("Connecting to {device}..."));
                self.active_device = None;
                self.phase = Phase::Connecting(device);
            }
            MonitorSignal::Listening(device) => {
                screen.set_status(&format!("Listening to {device}"));
                self.active_device = Some(device.clone());
                self.phase = Phase::Listening(device);
            }
            MonitorSignal::ConnectionFailed(err) | MonitorSignal::SessionLost(err) => {
                screen.set_status(&err.to_string());
                self.active_device = None;
                self.phase = Phase::Error(err);
            }
            MonitorSignal::Disconnected(device) => {
                screen.set_status(&format!("Disconnected from {device}"));
                self.active_device = None;
                self.phase = Phase::Idle;
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::ScreenModel;

    fn polar() -> DeviceDescriptor {
        DeviceDescriptor::new("A0:9E:1A:E0:4C:A3", "Polar H9")
    }

    #[test]
    fn empty_scan_is_not_an_error() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();

        state.apply(MonitorSignal::ScanStarted, &mut model);
        assert_eq!(state.phase(), &Phase::Scanning);

        state.apply(MonitorSignal::NoDevicesFound, &mut model);
        assert_eq!(state.phase(), &Phase::Idle);
        assert_eq!(model.status, NO_DEVICES_FOUND);
    }

    #[test]
    fn scan_failure_is_reported_distinctly() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();

        state.apply(MonitorSignal::ScanStarted, &mut model);
        let err = MonitorError::ScanFailure("adapter powered off".to_string());
        state.apply(MonitorSignal::ScanFailed(err.clone()), &mut model);

        assert_eq!(state.phase(), &Phase::Error(err));
        assert_ne!(model.status, NO_DEVICES_FOUND);
        assert!(model.status.contains("adapter powered off"));
        assert!(model.devices.is_empty());
    }

    #[test]
    fn found_devices_are_presented() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();

        state.apply(MonitorSignal::DevicesFound(vec![polar()]), &mut model);
        assert_eq!(state.phase(), &Phase::Presenting);
        assert_eq!(model.devices, vec![polar()]);
    }

    #[test]
    fn selection_walks_through_connecting_to_listening() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();

        state.apply(MonitorSignal::Connecting(polar()), &mut model);
        assert_eq!(state.phase(), &Phase::Connecting(polar()));
        assert_eq!(state.active_device(), None);

        state.apply(MonitorSignal::Listening(polar()), &mut model);
        assert_eq!(state.phase(), &Phase::Listening(polar()));
        assert_eq!(state.active_device(), Some(&polar()));
    }

    #[test]
    fn session_loss_keeps_displayed_value() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();
        model.set_value(72);

        state.apply(MonitorSignal::Listening(polar()), &mut model);
        let err = MonitorError::SessionLost("out of range".to_string());
        state.apply(MonitorSignal::SessionLost(err.clone()), &mut model);

        assert_eq!(state.phase(), &Phase::Error(err));
        assert_eq!(state.active_device(), None);
        assert_eq!(model.value_text, "72");
    }

    #[test]
    fn rescanning_while_listening_keeps_active_device() {
        let mut state = MonitorState::new();
        let mut model = ScreenModel::default();

        state.apply(MonitorSignal::Listening(polar()), &mut model);
        state.apply(MonitorSignal::ScanStarted, &mut model);

        assert_eq!(state.phase(), &Phase::Scanning);
        assert_eq!(state.active_device(), Some(&polar()));
    }
}
