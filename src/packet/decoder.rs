//! # Frame Decoder
//!
//! Parses frames read from the radio FIFO.

use bytes::Buf;

use super::protocol::*;
use crate::error::{Result, StationError};

/// Decode a complete frame
///
/// # Arguments
///
/// * `bytes` - Bytes drained from the radio FIFO, starting with the length byte
///
/// # Returns
///
/// * `Result<Frame>` - Decoded frame with `rssi` left at zero, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Frame is shorter than the fixed header
/// - Length byte promises more bytes than were read
/// - Data size exceeds [`CONTENT_DATA_SIZE`] or disagrees with the length byte
///
/// The packet type is not validated here; dispatch decides what to do with
/// unknown types.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < MIN_FRAME_SIZE {
        return Err(StationError::Codec(format!(
            "Frame too short: {} bytes",
            bytes.len()
        )));
    }

    let length = bytes[0] as usize;
    if length < MIN_FRAME_SIZE - 1 {
        return Err(StationError::Codec(format!("Invalid length byte: {}", length)));
    }

    if bytes.len() < 1 + length {
        return Err(StationError::Codec(format!(
            "Frame too short: expected {} bytes, got {}",
            1 + length,
            bytes.len()
        )));
    }

    let mut reader = &bytes[1..1 + length];

    let target = reader.get_u8();
    let source = reader.get_u8();

    let mut timestamp = [0u8; TIMESTAMP_SIZE];
    reader.copy_to_slice(&mut timestamp);

    let packet_type = reader.get_u8();
    let size = reader.get_u8();

    if size as usize > CONTENT_DATA_SIZE {
        return Err(StationError::Codec(format!(
            "Data size {} exceeds maximum {}",
            size, CONTENT_DATA_SIZE
        )));
    }

    if reader.remaining() != size as usize {
        return Err(StationError::Codec(format!(
            "Data size mismatch: header says {}, frame carries {}",
            size,
            reader.remaining()
        )));
    }

    let mut data = [0u8; CONTENT_DATA_SIZE];
    reader.copy_to_slice(&mut data[..size as usize]);

    Ok(Frame {
        header: Header {
            target,
            source,
            rssi: 0,
        },
        content: Content {
            timestamp: Timestamp::from_bytes(timestamp),
            packet_type,
            size,
            data,
        },
    })
}
