//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, StationError};
use crate::node::MAX_NUMBER_OF_NODES;
use crate::packet::protocol::{
    Address, DEFAULT_BROADCAST_ADDRESS, DEFAULT_NODE_ADDRESS_BASE, DEFAULT_STATION_ADDRESS,
    INVALID_ADDRESS,
};
use crate::radio::{RadioSettings, AES_KEY_SIZE};

/// Longest sync word the radio accepts
pub const MAX_NETWORK_ID_SIZE: usize = 8;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub station: StationConfig,
    pub radio: RadioConfig,
    pub nodes: NodesConfig,
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

/// Base station identity
#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    #[serde(default = "default_station_address")]
    pub address: Address,

    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: Address,

    /// Radio sync word shared by every device of the network
    #[serde(default = "default_network_id")]
    pub network_id: Vec<u8>,

    #[serde(default = "default_aes_key")]
    pub aes_key: String,
}

/// Radio link parameters
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_carrier_frequency_hz")]
    pub carrier_frequency_hz: u32,

    #[serde(default = "default_bit_rate")]
    pub bit_rate: u32,

    #[serde(default = "default_frequency_deviation_hz")]
    pub frequency_deviation_hz: u32,

    #[serde(default = "default_preamble_length")]
    pub preamble_length: u16,

    #[serde(default = "default_power_level")]
    pub power_level: u8,

    #[serde(default = "default_rssi_threshold")]
    pub rssi_threshold: i8,
}

/// Field node configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NodesConfig {
    #[serde(default = "default_node_count")]
    pub count: usize,

    /// Address of the first node; node `i` uses `address_base + i`
    #[serde(default = "default_node_address_base")]
    pub address_base: Address,

    /// Interval at which nodes send readings
    #[serde(default = "default_report_interval_s")]
    pub report_interval_s: u32,
}

/// Scheduler loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_status_interval_s")]
    pub status_interval_s: u64,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_station_address() -> Address { DEFAULT_STATION_ADDRESS }
fn default_broadcast_address() -> Address { DEFAULT_BROADCAST_ADDRESS }
fn default_network_id() -> Vec<u8> { vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF] }
fn default_aes_key() -> String { "1DUMMYKEYFOOBAR1".to_string() }

fn default_carrier_frequency_hz() -> u32 { 868_000_000 }
fn default_bit_rate() -> u32 { 4800 }
fn default_frequency_deviation_hz() -> u32 { 5000 }
fn default_preamble_length() -> u16 { 8 }
fn default_power_level() -> u8 { 28 }
fn default_rssi_threshold() -> i8 { -85 }

fn default_node_count() -> usize { MAX_NUMBER_OF_NODES }
fn default_node_address_base() -> Address { DEFAULT_NODE_ADDRESS_BASE }
fn default_report_interval_s() -> u32 { 10 }

fn default_tick_ms() -> u64 { 1 }
fn default_status_interval_s() -> u64 { 30 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            station: StationConfig {
                address: default_station_address(),
                broadcast_address: default_broadcast_address(),
                network_id: default_network_id(),
                aes_key: default_aes_key(),
            },
            radio: RadioConfig {
                carrier_frequency_hz: default_carrier_frequency_hz(),
                bit_rate: default_bit_rate(),
                frequency_deviation_hz: default_frequency_deviation_hz(),
                preamble_length: default_preamble_length(),
                power_level: default_power_level(),
                rssi_threshold: default_rssi_threshold(),
            },
            nodes: NodesConfig {
                count: default_node_count(),
                address_base: default_node_address_base(),
                report_interval_s: default_report_interval_s(),
            },
            scheduler: SchedulerConfig {
                tick_ms: default_tick_ms(),
                status_interval_s: default_status_interval_s(),
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
                format: default_log_format(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sensor_station::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate station identity
        if self.station.address == INVALID_ADDRESS
            || self.station.address == self.station.broadcast_address
        {
            return Err(StationError::Config(
                toml::de::Error::custom("station address must be nonzero and differ from broadcast_address")
            ));
        }

        if self.station.broadcast_address == INVALID_ADDRESS {
            return Err(StationError::Config(
                toml::de::Error::custom("broadcast_address cannot be 0")
            ));
        }

        if self.station.network_id.is_empty() || self.station.network_id.len() > MAX_NETWORK_ID_SIZE {
            return Err(StationError::Config(
                toml::de::Error::custom("network_id must be between 1 and 8 bytes")
            ));
        }

        // Sync word bytes of zero are not detected by the radio
        if self.station.network_id.contains(&0) {
            return Err(StationError::Config(
                toml::de::Error::custom("network_id cannot contain zero bytes")
            ));
        }

        if self.station.aes_key.len() != AES_KEY_SIZE {
            return Err(StationError::Config(
                toml::de::Error::custom("aes_key must be exactly 16 bytes")
            ));
        }

        // Validate radio parameters
        if self.radio.carrier_frequency_hz < 290_000_000 || self.radio.carrier_frequency_hz > 1_020_000_000 {
            return Err(StationError::Config(
                toml::de::Error::custom("carrier_frequency_hz must be between 290000000 and 1020000000")
            ));
        }

        if self.radio.bit_rate < 1200 || self.radio.bit_rate > 300_000 {
            return Err(StationError::Config(
                toml::de::Error::custom("bit_rate must be between 1200 and 300000")
            ));
        }

        if self.radio.frequency_deviation_hz < 600 || self.radio.frequency_deviation_hz > 300_000 {
            return Err(StationError::Config(
                toml::de::Error::custom("frequency_deviation_hz must be between 600 and 300000")
            ));
        }

        if self.radio.power_level > 31 {
            return Err(StationError::Config(
                toml::de::Error::custom("power_level must be between 0 and 31")
            ));
        }

        if self.radio.rssi_threshold > 0 {
            return Err(StationError::Config(
                toml::de::Error::custom("rssi_threshold must be 0 or below")
            ));
        }

        // Validate node addressing
        if self.nodes.count == 0 || self.nodes.count > MAX_NUMBER_OF_NODES {
            return Err(StationError::Config(
                toml::de::Error::custom("node count must be between 1 and 3")
            ));
        }

        let first = self.nodes.address_base as usize;
        let last = first + self.nodes.count - 1;
        let reserved = [
            INVALID_ADDRESS as usize,
            self.station.address as usize,
            self.station.broadcast_address as usize,
        ];
        if last > Address::MAX as usize || reserved.iter().any(|a| (first..=last).contains(a)) {
            return Err(StationError::Config(
                toml::de::Error::custom("node addresses must not overlap the station, broadcast or reserved address")
            ));
        }

        if self.nodes.report_interval_s == 0 || self.nodes.report_interval_s > 86_400 {
            return Err(StationError::Config(
                toml::de::Error::custom("report_interval_s must be between 1 and 86400")
            ));
        }

        // Validate scheduler timing
        if self.scheduler.tick_ms == 0 || self.scheduler.tick_ms > 1000 {
            return Err(StationError::Config(
                toml::de::Error::custom("tick_ms must be between 1 and 1000")
            ));
        }

        if self.scheduler.status_interval_s == 0 {
            return Err(StationError::Config(
                toml::de::Error::custom("status_interval_s must be greater than 0")
            ));
        }

        // Validate telemetry configuration
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(StationError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled")
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(StationError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0")
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(StationError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0")
            ));
        }

        if self.telemetry.format != "jsonl" {
            return Err(StationError::Config(
                toml::de::Error::custom("telemetry format must be \"jsonl\"")
            ));
        }

        Ok(())
    }

    /// Radio parameters for the transceiver
    pub fn radio_settings(&self) -> RadioSettings {
        let mut aes_key = [0u8; AES_KEY_SIZE];
        for (dst, src) in aes_key.iter_mut().zip(self.station.aes_key.bytes()) {
            *dst = src;
        }

        RadioSettings {
            carrier_frequency_hz: self.radio.carrier_frequency_hz,
            bit_rate: self.radio.bit_rate,
            frequency_deviation_hz: self.radio.frequency_deviation_hz,
            preamble_length: self.radio.preamble_length,
            power_level: self.radio.power_level,
            rssi_threshold: self.radio.rssi_threshold,
            network_id: self.station.network_id.clone(),
            node_address: self.station.address,
            broadcast_address: self.station.broadcast_address,
            aes_key,
        }
    }

    /// Node report interval in milliseconds
    pub fn report_interval_ms(&self) -> u32 {
        self.nodes.report_interval_s.saturating_mul(1000)
    }
}
