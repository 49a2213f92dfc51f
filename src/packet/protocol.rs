//! # Packet Protocol Constants and Types
//!
//! Core definitions for frames exchanged between the base station and the
//! field nodes.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, StationError};

/// Radio address of a station or node
pub type Address = u8;

/// Reserved address, never valid as a target or source
pub const INVALID_ADDRESS: Address = 0x00;

/// Default broadcast address
pub const DEFAULT_BROADCAST_ADDRESS: Address = 0xFF;

/// Default address of the base station (field nodes report to this address)
pub const DEFAULT_STATION_ADDRESS: Address = 0xAA;

/// Default address of the first field node; node `i` uses `base + i`
pub const DEFAULT_NODE_ADDRESS_BASE: Address = 0x80;

/// Capacity of the content data buffer
pub const CONTENT_DATA_SIZE: usize = 20;
const _: () = assert!(CONTENT_DATA_SIZE <= u8::MAX as usize);

/// Encoded timestamp size (year, month, date, hour, minute, second)
pub const TIMESTAMP_SIZE: usize = 6;

/// Frame header size on the wire: length(1) + target(1) + source(1)
pub const FRAME_HEADER_SIZE: usize = 3;

/// Content header size on the wire: timestamp(6) + type(1) + size(1)
pub const CONTENT_HEADER_SIZE: usize = TIMESTAMP_SIZE + 2;

/// Largest encoded frame, including the leading length byte
pub const MAX_FRAME_SIZE: usize = FRAME_HEADER_SIZE + CONTENT_HEADER_SIZE + CONTENT_DATA_SIZE;

/// Smallest encoded frame (no content data)
pub const MIN_FRAME_SIZE: usize = FRAME_HEADER_SIZE + CONTENT_HEADER_SIZE;

/// Hardware FIFO size of the radio
pub const RADIO_FIFO_SIZE: usize = 66;
const _: () = assert!(MAX_FRAME_SIZE <= RADIO_FIFO_SIZE);

/// Address of the field node stored at `index` in the node registry
///
/// # Panics
///
/// Panics if the address would overflow or land on the reserved address.
pub fn node_address(base: Address, index: usize) -> Address {
    let address = base as usize + index;
    assert!(
        address <= Address::MAX as usize && address != INVALID_ADDRESS as usize,
        "node index {} does not map to a valid address from base 0x{:02X}",
        index,
        base
    );
    address as Address
}

/// Packet types understood by the station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Acknowledge
    Ack = 0,
    /// Generic data
    Data = 1,
    /// Sensor and battery reading from a field node
    Reading = 2,
    /// Current time pushed to a field node
    Time = 3,
}

impl PacketType {
    /// Number of packet types; raw values at or above this are invalid
    pub const COUNT: usize = 4;

    /// All packet types in discriminant order
    pub const ALL: [PacketType; PacketType::COUNT] = [
        PacketType::Ack,
        PacketType::Data,
        PacketType::Reading,
        PacketType::Time,
    ];

    /// Index of this type in per-type tables
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> Self {
        packet_type as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = StationError;

    fn try_from(raw: u8) -> Result<Self> {
        PacketType::ALL
            .get(raw as usize)
            .copied()
            .ok_or_else(|| StationError::Codec(format!("Invalid packet type: {}", raw)))
    }
}

/// Calendar time carried in every frame
///
/// `year` counts from 2000. An all-zero timestamp marks a frame sent while
/// the sender's RTC was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Timestamp {
    pub year: u8,
    pub month: u8,
    pub date: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// Timestamp substituted when the RTC cannot be read
    pub const ZERO: Timestamp = Timestamp {
        year: 0,
        month: 0,
        date: 0,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// True for the degraded all-zero timestamp
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Wire representation
    pub fn to_bytes(&self) -> [u8; TIMESTAMP_SIZE] {
        [self.year, self.month, self.date, self.hour, self.minute, self.second]
    }

    /// Parse the wire representation
    pub fn from_bytes(bytes: [u8; TIMESTAMP_SIZE]) -> Self {
        Self {
            year: bytes[0],
            month: bytes[1],
            date: bytes[2],
            hour: bytes[3],
            minute: bytes[4],
            second: bytes[5],
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "20{:02}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.date, self.hour, self.minute, self.second
        )
    }
}

/// Frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    /// Destination address
    pub target: Address,

    /// Sender address, stamped by the transceiver on send
    pub source: Address,

    /// Signal strength in dBm, captured on reception (not sent on the wire)
    pub rssi: i8,
}

/// Frame content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Content {
    /// Time of sending
    pub timestamp: Timestamp,

    /// Raw packet type; inbound frames may carry values outside [`PacketType`]
    pub packet_type: u8,

    /// Number of valid bytes in `data`
    pub size: u8,

    /// Payload buffer
    pub data: [u8; CONTENT_DATA_SIZE],
}

impl Default for Content {
    fn default() -> Self {
        Self {
            timestamp: Timestamp::ZERO,
            packet_type: 0,
            size: 0,
            data: [0; CONTENT_DATA_SIZE],
        }
    }
}

impl Content {
    /// Create content from a payload slice
    ///
    /// # Errors
    ///
    /// Returns error if `payload` exceeds [`CONTENT_DATA_SIZE`] bytes
    pub fn new(packet_type: impl Into<u8>, timestamp: Timestamp, payload: &[u8]) -> Result<Self> {
        if payload.len() > CONTENT_DATA_SIZE {
            return Err(StationError::Codec(format!(
                "Payload size {} exceeds maximum {}",
                payload.len(),
                CONTENT_DATA_SIZE
            )));
        }

        let mut data = [0u8; CONTENT_DATA_SIZE];
        data[..payload.len()].copy_from_slice(payload);

        Ok(Self {
            timestamp,
            packet_type: packet_type.into(),
            size: payload.len() as u8,
            data,
        })
    }

    /// Whether `size` fits the data buffer
    pub fn is_size_valid(&self) -> bool {
        self.size as usize <= CONTENT_DATA_SIZE
    }

    /// Valid part of the data buffer
    pub fn payload(&self) -> &[u8] {
        let size = (self.size as usize).min(CONTENT_DATA_SIZE);
        &self.data[..size]
    }

    /// Typed packet type, if in range
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::try_from(self.packet_type).ok()
    }
}

/// One radio packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pub header: Header,
    pub content: Content,
}

impl Frame {
    /// Number of bytes this frame occupies on the wire, including the length byte
    pub fn encoded_len(&self) -> usize {
        MIN_FRAME_SIZE + self.content.payload().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_constants() {
        assert_eq!(CONTENT_DATA_SIZE, 20);
        assert_eq!(MIN_FRAME_SIZE, 11);
        assert_eq!(MAX_FRAME_SIZE, 31);
        assert!(MAX_FRAME_SIZE <= RADIO_FIFO_SIZE);
    }

    #[test]
    fn test_packet_type_conversion() {
        for packet_type in PacketType::ALL {
            let raw: u8 = packet_type.into();
            assert_eq!(PacketType::try_from(raw).unwrap(), packet_type);
            assert_eq!(packet_type.index(), raw as usize);
        }
    }

    #[test]
    fn test_packet_type_out_of_range() {
        assert!(PacketType::try_from(PacketType::COUNT as u8).is_err());
        assert!(PacketType::try_from(0xFF).is_err());
    }

    #[test]
    fn test_node_address() {
        assert_eq!(node_address(DEFAULT_NODE_ADDRESS_BASE, 0), 0x80);
        assert_eq!(node_address(DEFAULT_NODE_ADDRESS_BASE, 2), 0x82);
    }

    #[test]
    #[should_panic]
    fn test_node_address_overflow() {
        node_address(0xFE, 2);
    }

    #[test]
    fn test_timestamp_display() {
        let timestamp = Timestamp {
            year: 24,
            month: 3,
            date: 9,
            hour: 7,
            minute: 5,
            second: 59,
        };
        assert_eq!(timestamp.to_string(), "2024-03-09 07:05:59");
        assert!(!timestamp.is_zero());
        assert!(Timestamp::ZERO.is_zero());
    }

    #[test]
    fn test_content_new() {
        let content = Content::new(PacketType::Reading, Timestamp::ZERO, &[1, 2, 3]).unwrap();
        assert_eq!(content.size, 3);
        assert_eq!(content.payload(), &[1, 2, 3]);
        assert_eq!(content.packet_type(), Some(PacketType::Reading));
    }

    #[test]
    fn test_content_payload_too_large() {
        let result = Content::new(PacketType::Data, Timestamp::ZERO, &[0u8; CONTENT_DATA_SIZE + 1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_content_max_payload() {
        let content = Content::new(PacketType::Data, Timestamp::ZERO, &[0xAB; CONTENT_DATA_SIZE]).unwrap();
        assert_eq!(content.payload().len(), CONTENT_DATA_SIZE);
        assert!(content.is_size_valid());
    }

    #[test]
    fn test_content_oversized_size_field_is_clamped() {
        let mut content = Content::default();
        content.size = 200;
        assert!(!content.is_size_valid());
        assert_eq!(content.payload().len(), CONTENT_DATA_SIZE);
    }

    #[test]
    fn test_unknown_packet_type_in_content() {
        let mut content = Content::default();
        content.packet_type = 9;
        assert_eq!(content.packet_type(), None);
    }

    #[test]
    fn test_frame_encoded_len() {
        let frame = Frame {
            header: Header::default(),
            content: Content::new(PacketType::Time, Timestamp::ZERO, &[0; 6]).unwrap(),
        };
        assert_eq!(frame.encoded_len(), 17);
    }
}
