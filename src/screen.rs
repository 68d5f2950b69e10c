use crate::transport::DeviceDescriptor;

/// The three things background work may change on screen.
pub trait Screen {
    fn set_value(&mut self, heart_rate: u16);

    /// Replace the selectable device list, one action per descriptor.
    fn present_devices(&mut self, devices: &[DeviceDescriptor]);

    fn set_status(&mut self, text: &str);
}

/// What the window draws. Kept apart from egui so it can be driven headless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenModel {
    pub value_text: String,
    pub devices: Vec<DeviceDescriptor>,
    pub status: String,
}

impl Default for ScreenModel {
    fn default() -> Self {
        ScreenModel {
            value_text: "0".to_string(),
            devices: vec![],
            status: String::new(),
        }
    }
}

impl Screen for ScreenModel {
    fn set_value(&mut self, heart_rate: u16) {
        self.value_text = heart_rate.to_string();
    }

    fn present_devices(&mut self, devices: &[DeviceDescriptor]) {
        self.devices = devices.to_vec();
    }

    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
    }
}
