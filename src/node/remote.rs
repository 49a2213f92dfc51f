//! Field node state as seen from the base station

use serde::Serialize;
use tracing::warn;

use crate::clock::MonotonicClock;
use crate::packet::protocol::Address;
use crate::packet::report::NodeReport;

/// Battery voltage at or below which a node's battery is considered low
pub const LOW_BATTERY_LIMIT_MV: u16 = 2200;

/// Number of missed report intervals after which a node is considered inactive
pub const INACTIVITY_INTERVALS: u32 = 2;

/// Sensor reading with validity flag
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorValue {
    pub value: i16,
    pub valid: bool,
}

/// Battery state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Battery {
    /// Voltage in mV
    pub voltage_mv: u16,
    /// Temperature in °C
    pub temperature: i16,
    pub charging: bool,
    pub charger_connected: bool,
}

/// Remote field node
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    id: Address,
    connected: bool,
    last_active_ms: u32,
    rssi: i8,
    battery: Battery,
    temperature: SensorValue,
    humidity: SensorValue,
}

impl Node {
    /// Create a node with the given address and no recorded activity
    pub fn new(id: Address) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> Address {
        self.id
    }

    /// Mark the node as heard from now
    pub fn report_activity(&mut self, clock: &dyn MonotonicClock) {
        self.connected = true;
        self.last_active_ms = clock.milliseconds();
    }

    /// Whether the node has reported within the last two report intervals
    ///
    /// # Arguments
    ///
    /// * `clock` - Uptime source
    /// * `report_interval_ms` - Interval at which nodes send readings
    pub fn is_active(&self, clock: &dyn MonotonicClock, report_interval_ms: u32) -> bool {
        let limit = report_interval_ms.saturating_mul(INACTIVITY_INTERVALS);
        self.connected && clock.time_difference(self.last_active_ms) < limit
    }

    /// Apply a reading payload
    ///
    /// # Returns
    ///
    /// * `bool` - `false` if the payload could not be decoded; the node is
    ///   left unchanged
    pub fn update(&mut self, payload: &[u8]) -> bool {
        let report = match NodeReport::decode(payload) {
            Ok(report) => report,
            Err(e) => {
                warn!("Node 0x{:02X}: {}", self.id, e);
                return false;
            }
        };

        self.battery = Battery {
            voltage_mv: report.battery_voltage,
            temperature: report.battery_temperature,
            charging: report.charging,
            charger_connected: report.charger_connected,
        };
        self.temperature = SensorValue {
            value: report.temperature,
            valid: report.sensor_valid,
        };
        self.humidity = SensorValue {
            value: report.humidity,
            valid: report.sensor_valid,
        };
        true
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn battery_voltage(&self) -> u16 {
        self.battery.voltage_mv
    }

    pub fn battery_temperature(&self) -> i16 {
        self.battery.temperature
    }

    pub fn is_battery_charging(&self) -> bool {
        self.battery.charging
    }

    pub fn is_charger_connected(&self) -> bool {
        self.battery.charger_connected
    }

    /// Whether the battery voltage is above [`LOW_BATTERY_LIMIT_MV`]
    pub fn is_battery_ok(&self) -> bool {
        self.battery.voltage_mv > LOW_BATTERY_LIMIT_MV
    }

    /// Signal strength of the last frame received from this node
    pub fn rssi(&self) -> i8 {
        self.rssi
    }

    pub fn set_rssi(&mut self, rssi: i8) {
        self.rssi = rssi;
    }

    /// Temperature in 0.1 °C
    pub fn temperature(&self) -> SensorValue {
        self.temperature
    }

    /// Relative humidity in 0.1 %RH
    pub fn humidity(&self) -> SensorValue {
        self.humidity
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn last_active_ms(&self) -> u32 {
        self.last_active_ms
    }
}
