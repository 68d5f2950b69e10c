use crate::error::{MonitorError, Result};

const FLAG_HR_FORMAT_U16: u8 = 0x01;

/// Decodes a Heart Rate Measurement value into beats per minute.
///
/// Only the value format bit of the flags byte is looked at. Sensor contact,
/// energy expended and RR-interval fields are ignored.
pub fn decode(payload: &[u8]) -> Result<u16> {
    let Some(&flags) = payload.first() else {
        return Err(MonitorError::MalformedPayload { needed: 1, actual: 0 });
    };

    if flags & FLAG_HR_FORMAT_U16 == 0 {
        match payload.get(1) {
            Some(&hr) => Ok(u16::from(hr)),
            None => Err(MonitorError::MalformedPayload { needed: 2, actual: payload.len() }),
        }
    } else {
        match payload.get(1..3) {
            Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
            _ => Err(MonitorError::MalformedPayload { needed: 3, actual: payload.len() }),
        }
    }
}
