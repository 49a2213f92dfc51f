//! # Com
//!
//! Dispatches received frames to per-type handlers and builds outgoing frames.
//!
//! A handler is a plain function receiving the `Com` itself (so it can reply),
//! the application state `A`, and the frame being dispatched. The table holds
//! one handler per [`PacketType`]; frames of a type without a handler are
//! dropped.

use tracing::{debug, error, info, warn};

use crate::error_log::{ErrorCode, ErrorLog};
use crate::packet::protocol::{Address, Content, Frame, PacketType, Timestamp, CONTENT_DATA_SIZE, INVALID_ADDRESS};
use crate::radio::RadioLink;
use crate::rtc::Rtc;
use crate::transceiver::Transceiver;

/// Frame handler
///
/// # Returns
///
/// * `bool` - `true` if the frame was fully handled
pub type PacketHandler<R, A> = fn(&mut Com<R, A>, &mut A, &Frame) -> bool;

/// Dispatch counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComStatistics {
    /// Frames accepted by the transceiver
    pub sent: u32,
    /// Frames the transceiver refused
    pub lost: u32,
    /// Frames of a known type taken from the inbound queue
    pub received: u32,
    /// Frames carrying an out-of-range type
    pub invalid: u32,
    /// Frames whose handler reported them fully handled
    pub handled: u32,
}

/// Frame dispatcher and sender
pub struct Com<R: RadioLink, A> {
    transceiver: Transceiver<R>,
    rtc: Box<dyn Rtc>,
    error_log: Box<dyn ErrorLog>,
    handlers: [Option<PacketHandler<R, A>>; PacketType::COUNT],
    statistics: ComStatistics,
}

impl<R: RadioLink, A> std::fmt::Debug for Com<R, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Com")
            .field("transceiver", &self.transceiver)
            .field("statistics", &self.statistics)
            .finish_non_exhaustive()
    }
}

impl<R: RadioLink, A> Com<R, A> {
    /// Create a dispatcher with an empty handler table
    pub fn new(transceiver: Transceiver<R>, rtc: Box<dyn Rtc>, error_log: Box<dyn ErrorLog>) -> Self {
        Self {
            transceiver,
            rtc,
            error_log,
            handlers: [None; PacketType::COUNT],
            statistics: ComStatistics::default(),
        }
    }

    /// Register `handler` for `packet_type`, replacing any previous one
    ///
    /// # Panics
    ///
    /// Panics if `packet_type` is not a known packet type
    pub fn set_packet_handler(&mut self, handler: PacketHandler<R, A>, packet_type: impl Into<u8>) {
        let index = packet_type.into() as usize;
        assert!(index < PacketType::COUNT, "packet type {} out of range", index);
        self.handlers[index] = Some(handler);
    }

    /// Dispatch at most one received frame
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if a frame was taken from the inbound queue
    pub fn update(&mut self, app: &mut A) -> bool {
        let Some(frame) = self.transceiver.receive_packet() else {
            return false;
        };

        let index = frame.content.packet_type as usize;
        let Some(slot) = self.handlers.get(index).copied() else {
            warn!(
                "Dropping frame from 0x{:02X} with invalid type {}",
                frame.header.source, frame.content.packet_type
            );
            self.statistics.invalid += 1;
            return true;
        };
        self.statistics.received += 1;

        match slot {
            Some(handler) => {
                if handler(self, app, &frame) {
                    self.statistics.handled += 1;
                }
            }
            None => {
                debug!(
                    "No handler for type {}, dropping frame from 0x{:02X}",
                    frame.content.packet_type, frame.header.source
                );
            }
        }

        true
    }

    /// Build a frame stamped with the current time and queue it
    ///
    /// If the RTC cannot be read the failure is logged and the frame carries
    /// [`Timestamp::ZERO`].
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if the transceiver accepted the frame
    ///
    /// # Panics
    ///
    /// Panics if `target` is the reserved address, `packet_type` is out of range,
    /// or `data` exceeds [`CONTENT_DATA_SIZE`]
    pub fn send(&mut self, target: Address, packet_type: impl Into<u8>, data: &[u8]) -> bool {
        let packet_type = packet_type.into();
        assert!(target != INVALID_ADDRESS, "cannot send to reserved address");
        assert!(
            (packet_type as usize) < PacketType::COUNT,
            "packet type {} out of range",
            packet_type
        );
        assert!(
            data.len() <= CONTENT_DATA_SIZE,
            "payload of {} bytes exceeds {}",
            data.len(),
            CONTENT_DATA_SIZE
        );

        let timestamp = self.current_time().unwrap_or(Timestamp::ZERO);

        let mut content = Content {
            timestamp,
            packet_type,
            size: data.len() as u8,
            ..Content::default()
        };
        content.data[..data.len()].copy_from_slice(data);

        let accepted = self.transceiver.send_packet(target, &content);
        if accepted {
            self.statistics.sent += 1;
        } else {
            debug!("Frame to 0x{:02X} not accepted", target);
            self.statistics.lost += 1;
        }
        accepted
    }

    /// Read the RTC, logging [`ErrorCode::RtcFail`] on failure
    pub fn current_time(&mut self) -> Option<Timestamp> {
        match self.rtc.current_time() {
            Ok(timestamp) => Some(timestamp),
            Err(e) => {
                error!("Failed to read RTC: {}", e);
                self.error_log.log_error(ErrorCode::RtcFail, 0);
                None
            }
        }
    }

    /// Append an entry to the error log
    pub fn log_error(&mut self, code: ErrorCode, information: u8) {
        self.error_log.log_error(code, information);
    }

    pub fn dump_error_log(&self) {
        info!("Com statistics: {:?}", self.statistics);
        self.error_log.dump();
    }

    pub fn statistics(&self) -> ComStatistics {
        self.statistics
    }

    pub fn transceiver(&self) -> &Transceiver<R> {
        &self.transceiver
    }

    pub fn transceiver_mut(&mut self) -> &mut Transceiver<R> {
        &mut self.transceiver
    }
}
