use eframe::egui::{Button, Color32, Label, RichText, Rounding};

use crate::transport::DeviceDescriptor;


pub fn get_heart_rate_label(value_text: &str, size: f32) -> Label {
    let live_hr_text = RichText::new(value_text)
        .color(Color32::RED)
        .strong()
        .size(size);

    Label::new(live_hr_text)
}

pub fn get_device_button(device: &DeviceDescriptor) -> Button<'static> {
    let device_text = RichText::new(device.label())
        .color(Color32::BLACK)
        .size(20.0);

    Button::new(device_text)
        .fill(Color32::LIGHT_BLUE)
        .rounding(Rounding::same(8.0))
}

pub fn get_active_device_label(device: &DeviceDescriptor) -> Label {
    let device_text = RichText::new(device.label())
        .color(Color32::WHITE)
        .background_color(Color32::RED)
        .size(20.0);

    Label::new(device_text)
}

pub fn get_scan_button(scanning: bool) -> Button<'static> {
    let text = if scanning { "Scanning..." } else { "Scan for devices" };
    let text = RichText::new(text)
        .color(Color32::WHITE)
        .size(20.0);

    Button::new(text)
        .fill(Color32::DARK_GREEN)
        .rounding(Rounding::same(8.0))
}

pub fn get_disconnect_device_button() -> Button<'static> {
    let text = RichText::new("Disconnect")
        .color(Color32::RED)
        .background_color(Color32::WHITE)
        .size(20.0);

    Button::new(text)
        .fill(Color32::BLUE)
        .rounding(Rounding::same(8.0))
}

pub fn get_reconnect_button(device: &DeviceDescriptor) -> Button<'static> {
    let text = RichText::new(format!("Reconnect to {}", device.name))
        .color(Color32::WHITE)
        .size(20.0);

    Button::new(text)
        .fill(Color32::BLUE)
        .rounding(Rounding::same(8.0))
}

pub fn get_status_label(status: &str) -> Label {
    Label::new(RichText::new(status).size(16.0))
}
