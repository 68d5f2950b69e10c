use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::decoder;
use crate::session::NotificationHandler;

/// Single-slot store for the latest heart rate.
///
/// Cloning gives another handle to the same slot. The notification handler
/// writes, the refresh loop reads.
#[derive(Debug, Clone, Default)]
pub struct HeartRateBridge {
    value: Arc<AtomicU16>,
}

impl HeartRateBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, heart_rate: u16) {
        self.value.store(heart_rate, Ordering::Release);
    }

    pub fn get(&self) -> u16 {
        self.value.load(Ordering::Acquire)
    }

    /// Handler that decodes notifications into this bridge.
    pub fn writer(&self) -> BridgeWriter {
        BridgeWriter { bridge: self.clone() }
    }
}

/// Notification handler owning a handle to the bridge it writes.
#[derive(Debug, Clone)]
pub struct BridgeWriter {
    bridge: HeartRateBridge,
}

impl NotificationHandler for BridgeWriter {
    fn on_notification(&mut self, payload: &[u8]) {
        match decoder::decode(payload) {
            Ok(hr) => {
                debug!("heartbeat: {hr}");
                self.bridge.set(hr);
            }
            Err(err) => warn!("Dropping sample {:02x?}: {}", payload, err),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(HeartRateBridge::new().get(), 0);
    }

    #[test]
    fn last_write_wins() {
        let bridge = HeartRateBridge::new();
        bridge.set(72);
        bridge.set(81);
        assert_eq!(bridge.get(), 81);
    }

    #[test]
    fn clones_share_the_slot() {
        let bridge = HeartRateBridge::new();
        let other = bridge.clone();
        other.set(64);
        assert_eq!(bridge.get(), 64);
    }

    #[test]
    fn independent_bridges_do_not_interfere() {
        let a = HeartRateBridge::new();
        let b = HeartRateBridge::new();
        a.set(90);
        assert_eq!(b.get(), 0);
    }

    #[test]
    fn writer_decodes_and_drops_malformed() {
        let bridge = HeartRateBridge::new();
        let mut writer = bridge.writer();

        writer.on_notification(&[0x00, 60]);
        assert_eq!(bridge.get(), 60);

        writer.on_notification(&[0x01, 0x2c, 0x01]);
        assert_eq!(bridge.get(), 300);

        writer.on_notification(&[0x01, 0x10]);
        assert_eq!(bridge.get(), 300);
    }

    #[test]
    fn concurrent_writer_and_reader() {
        let bridge = HeartRateBridge::new();
        let writer = bridge.clone();
        let handle = std::thread::spawn(move || {
            for v in 1..=1000u16 {
                writer.set(v);
            }
        });
        let mut last = 0;
        for _ in 0..1000 {
            let seen = bridge.get();
            assert!(seen <= 1000);
            assert!(seen >= last);
            last = seen;
        }
        handle.join().unwrap();
        assert_eq!(bridge.get(), 1000);
    }
}
