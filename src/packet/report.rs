//! # Node Report Payload
//!
//! Fixed-layout battery and sensor snapshot carried in `Reading` packets.
//!
//! All multi-byte fields are little-endian:
//!
//! ```text
//! Byte 0..2:   battery voltage (u16, mV)
//! Byte 2..4:   battery temperature (i16, °C)
//! Byte 4:      charging (0/1)
//! Byte 5:      charger connected (0/1)
//! Byte 6..8:   humidity (i16, 0.1 %RH)
//! Byte 8..10:  temperature (i16, 0.1 °C)
//! Byte 10:     sensor reading valid (0/1)
//! ```
//!
//! The layout carries no version tag; both ends must agree on it.

use bytes::{Buf, BufMut};

use crate::error::{Result, StationError};

/// Encoded size of a [`NodeReport`]
pub const NODE_REPORT_SIZE: usize = 11;

/// Battery and sensor snapshot reported by a field node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeReport {
    pub battery_voltage: u16,
    pub battery_temperature: i16,
    pub charging: bool,
    pub charger_connected: bool,
    pub humidity: i16,
    pub temperature: i16,
    pub sensor_valid: bool,
}

impl NodeReport {
    /// Decode a report payload
    ///
    /// Extra trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns error if `payload` is shorter than [`NODE_REPORT_SIZE`]
    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() < NODE_REPORT_SIZE {
            return Err(StationError::Codec(format!(
                "Report payload too short: {} bytes",
                payload.len()
            )));
        }

        let mut reader = payload;
        Ok(Self {
            battery_voltage: reader.get_u16_le(),
            battery_temperature: reader.get_i16_le(),
            charging: reader.get_u8() != 0,
            charger_connected: reader.get_u8() != 0,
            humidity: reader.get_i16_le(),
            temperature: reader.get_i16_le(),
            sensor_valid: reader.get_u8() != 0,
        })
    }

    /// Encode into the wire layout
    pub fn encode(&self) -> [u8; NODE_REPORT_SIZE] {
        let mut buffer = [0u8; NODE_REPORT_SIZE];
        let mut writer = &mut buffer[..];

        writer.put_u16_le(self.battery_voltage);
        writer.put_i16_le(self.battery_temperature);
        writer.put_u8(self.charging as u8);
        writer.put_u8(self.charger_connected as u8);
        writer.put_i16_le(self.humidity);
        writer.put_i16_le(self.temperature);
        writer.put_u8(self.sensor_valid as u8);

        buffer
    }
}
