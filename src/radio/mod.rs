//! # Radio Module
//!
//! Boundary between the link stack and the packet radio.
//!
//! This module handles:
//! - Radio operating modes
//! - The [`RadioLink`] trait the transceiver drives (mode control, FIFO access,
//!   status flags, RSSI)
//! - Link parameters applied once at startup
//! - An in-process simulator of field nodes for running without hardware
//!
//! Every [`RadioLink`] call is a single register poll or FIFO transfer and
//! must return without waiting on the hardware.

pub mod sim;

use crate::packet::protocol::Address;

/// AES key length used by the radio's packet engine
pub const AES_KEY_SIZE: usize = 16;

/// Radio operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    Sleep,
    Standby,
    Receiver,
    Transmitter,
}

/// Link parameters programmed into the radio at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioSettings {
    /// Carrier frequency in Hz
    pub carrier_frequency_hz: u32,

    /// Bit rate in bits/s
    pub bit_rate: u32,

    /// FSK frequency deviation in Hz
    pub frequency_deviation_hz: u32,

    /// Preamble length in bytes
    pub preamble_length: u16,

    /// Output power level (0-31)
    pub power_level: u8,

    /// RSSI threshold in dBm for detecting a packet
    pub rssi_threshold: i8,

    /// Sync word; isolates this network from others on the same channel
    pub network_id: Vec<u8>,

    /// Address used for hardware address filtering and as frame source
    pub node_address: Address,

    /// Address accepted in addition to `node_address`
    pub broadcast_address: Address,

    /// AES key loaded into the radio; encryption stays disabled
    pub aes_key: [u8; AES_KEY_SIZE],
}

/// Packet radio operations used by the transceiver
///
/// Mode changes are asynchronous: [`RadioLink::set_mode`] starts the switch and
/// [`RadioLink::is_mode_ready`] reports when it has completed.
pub trait RadioLink {
    /// Program the link parameters
    fn configure(&mut self, settings: &RadioSettings);

    /// Start switching to `mode`
    fn set_mode(&mut self, mode: RadioMode);

    /// Whether the last mode switch has completed
    fn is_mode_ready(&mut self) -> bool;

    /// Whether a complete packet is waiting in the FIFO
    fn is_payload_ready(&mut self) -> bool;

    /// Whether the receiver timed out waiting for a packet
    fn is_rx_timeout_flag_set(&mut self) -> bool;

    /// Whether the last transmission has finished
    fn is_packet_sent(&mut self) -> bool;

    /// Read up to `buffer.len()` bytes from the FIFO, returning the count read
    fn read_from_fifo(&mut self, buffer: &mut [u8]) -> usize;

    /// Write bytes into the FIFO for transmission
    fn write_to_fifo(&mut self, data: &[u8]);

    /// Discard the FIFO contents
    fn clear_fifo(&mut self);

    /// Signal strength of the last received packet in dBm
    fn rssi(&mut self) -> i8;

    /// Restart reception after a receiver timeout
    fn restart_rx(&mut self);
}
