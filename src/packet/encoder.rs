//! # Frame Encoder
//!
//! Serializes frames into the radio's variable-length packet format.

use std::ops::Deref;

use bytes::BufMut;

use super::protocol::*;

/// Encoded frame in a fixed-size buffer
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    buffer: [u8; MAX_FRAME_SIZE],
    len: usize,
}

impl EncodedFrame {
    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }
}

impl Deref for EncodedFrame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for EncodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_bytes()).finish()
    }
}

/// Encode a frame for transmission
///
/// # Arguments
///
/// * `frame` - Frame to encode; the RSSI field is not transmitted
///
/// # Returns
///
/// * `EncodedFrame` - Complete packet (length + target + source + timestamp + type + size + data)
///
/// # Layout
///
/// ```text
/// Byte 0:      length of the remaining bytes
/// Byte 1:      target address
/// Byte 2:      source address
/// Byte 3..9:   timestamp (year, month, date, hour, minute, second)
/// Byte 9:      packet type
/// Byte 10:     data size
/// Byte 11..:   data
/// ```
///
/// # Examples
///
/// ```
/// use sensor_station::packet::encoder::encode_frame;
/// use sensor_station::packet::protocol::{Content, Frame, Header, PacketType, Timestamp};
///
/// let frame = Frame {
///     header: Header { target: 0x80, source: 0xAA, rssi: 0 },
///     content: Content::new(PacketType::Ack, Timestamp::ZERO, &[]).unwrap(),
/// };
/// let encoded = encode_frame(&frame);
/// assert_eq!(encoded.len(), 11);
/// assert_eq!(encoded[0], 10);
/// ```
pub fn encode_frame(frame: &Frame) -> EncodedFrame {
    let payload = frame.content.payload();
    let len = frame.encoded_len();

    let mut buffer = [0u8; MAX_FRAME_SIZE];
    let mut writer = &mut buffer[..];

    writer.put_u8((len - 1) as u8);
    writer.put_u8(frame.header.target);
    writer.put_u8(frame.header.source);
    writer.put_slice(&frame.content.timestamp.to_bytes());
    writer.put_u8(frame.content.packet_type);
    writer.put_u8(payload.len() as u8);
    writer.put_slice(payload);

    EncodedFrame { buffer, len }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_payload(payload: &[u8]) -> Frame {
        Frame {
            header: Header {
                target: 0x80,
                source: DEFAULT_STATION_ADDRESS,
                rssi: -70,
            },
            content: Content::new(
                PacketType::Time,
                Timestamp {
                    year: 24,
                    month: 5,
                    date: 17,
                    hour: 12,
                    minute: 30,
                    second: 45,
                },
                payload,
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_encode_frame_structure() {
        let encoded = encode_frame(&frame_with_payload(&[0x11, 0x22]));

        assert_eq!(encoded.len(), 13);
        assert_eq!(encoded[0], 12); // Length excludes itself
        assert_eq!(encoded[1], 0x80); // Target
        assert_eq!(encoded[2], DEFAULT_STATION_ADDRESS); // Source
        assert_eq!(&encoded[3..9], &[24, 5, 17, 12, 30, 45]); // Timestamp
        assert_eq!(encoded[9], PacketType::Time as u8);
        assert_eq!(encoded[10], 2);
        assert_eq!(&encoded[11..], &[0x11, 0x22]);
    }

    #[test]
    fn test_encode_empty_payload() {
        let encoded = encode_frame(&frame_with_payload(&[]));
        assert_eq!(encoded.len(), MIN_FRAME_SIZE);
        assert_eq!(encoded[10], 0);
    }

    #[test]
    fn test_encode_max_payload() {
        let encoded = encode_frame(&frame_with_payload(&[0xFF; CONTENT_DATA_SIZE]));
        assert_eq!(encoded.len(), MAX_FRAME_SIZE);
        assert_eq!(encoded[0] as usize, MAX_FRAME_SIZE - 1);
    }

    #[test]
    fn test_rssi_is_not_transmitted() {
        let mut quiet = frame_with_payload(&[1]);
        let mut loud = frame_with_payload(&[1]);
        quiet.header.rssi = -100;
        loud.header.rssi = -30;
        assert_eq!(encode_frame(&quiet), encode_frame(&loud));
    }
}
