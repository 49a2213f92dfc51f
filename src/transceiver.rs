//! # Transceiver
//!
//! Drives the half-duplex radio between listening and sending.
//!
//! [`Transceiver::update`] is called once per scheduler tick and performs at
//! most one step of the state machine:
//!
//! ```text
//!            ┌──────────── packet sent ───────────────┐
//!            v                                        │
//!   Listening ── frame queued ──> SendInit ──> SendWaitModeReady ──> Sending
//!    │  ^                                          │
//!    │  └──────── nothing to send (abort) ─────────┘
//!    └─ payload ready: standby, drain FIFO, re-arm receiver next tick
//! ```
//!
//! Outbound and inbound traffic each go through a one-frame queue. A full
//! outbound queue makes [`Transceiver::send_packet`] fail; a frame arriving
//! while the inbound queue is full is dropped.

use heapless::Deque;
use tracing::{debug, info, warn};

use crate::event::Event;
use crate::packet::decoder::decode_frame;
use crate::packet::encoder::encode_frame;
use crate::packet::protocol::{Address, Content, Frame, Header, INVALID_ADDRESS, MAX_FRAME_SIZE};
use crate::radio::{RadioLink, RadioMode, RadioSettings};

/// Outbound queue depth
pub const TX_QUEUE_DEPTH: usize = 1;

/// Inbound queue depth
pub const RX_QUEUE_DEPTH: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransceiverState {
    /// `armed` is false until the receiver mode has been requested
    Listening { armed: bool },
    SendInit,
    SendWaitModeReady,
    Sending,
}

/// Link counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransceiverStatistics {
    /// Frames placed in the inbound queue
    pub received: u32,
    /// Frames dropped because the inbound queue was full
    pub rx_dropped: u32,
    /// Payloads that failed to decode
    pub rx_invalid: u32,
    /// Frames handed to the radio and reported sent
    pub transmitted: u32,
    /// Send sequences aborted because the outbound queue was empty
    pub tx_aborted: u32,
}

/// Radio state machine with single-slot queues
pub struct Transceiver<R: RadioLink> {
    radio: R,
    address: Address,
    state: TransceiverState,
    asleep: bool,
    tx_queue: Deque<Frame, TX_QUEUE_DEPTH>,
    rx_queue: Deque<Frame, RX_QUEUE_DEPTH>,
    statistics: TransceiverStatistics,
}

impl<R: RadioLink> std::fmt::Debug for Transceiver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transceiver")
            .field("address", &self.address)
            .field("state", &self.state)
            .field("asleep", &self.asleep)
            .finish_non_exhaustive()
    }
}

impl<R: RadioLink> Transceiver<R> {
    /// Configure the radio and create the transceiver
    ///
    /// The receiver is armed on the first [`Transceiver::update`].
    pub fn new(mut radio: R, settings: &RadioSettings) -> Self {
        radio.configure(settings);
        radio.clear_fifo();

        info!(
            "Transceiver initiated (address 0x{:02X}, {} Hz, {} bit/s)",
            settings.node_address, settings.carrier_frequency_hz, settings.bit_rate
        );

        Self {
            radio,
            address: settings.node_address,
            state: TransceiverState::Listening { armed: false },
            asleep: false,
            tx_queue: Deque::new(),
            rx_queue: Deque::new(),
            statistics: TransceiverStatistics::default(),
        }
    }

    /// Advance the state machine by one step
    pub fn update(&mut self) {
        if self.asleep {
            return;
        }

        let next_state = match self.state {
            TransceiverState::Listening { armed: false } => {
                self.radio.set_mode(RadioMode::Receiver);
                TransceiverState::Listening { armed: true }
            }
            TransceiverState::Listening { armed: true } => self.listen(),
            TransceiverState::SendInit => TransceiverState::SendWaitModeReady,
            TransceiverState::SendWaitModeReady => self.write_packet(),
            TransceiverState::Sending => self.wait_for_packet_sent(),
        };

        if next_state != self.state {
            debug!("Transceiver state: {:?} -> {:?}", self.state, next_state);
        }
        self.state = next_state;
    }

    /// Queue content for transmission to `target`
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if the frame was accepted for transmission. This is
    ///   not a delivery confirmation.
    ///
    /// Fails if `target` is the reserved address, if `content.size` exceeds the
    /// data capacity, or if the outbound queue is full.
    pub fn send_packet(&mut self, target: Address, content: &Content) -> bool {
        if target == INVALID_ADDRESS {
            warn!("Refusing to send to reserved address 0x{:02X}", target);
            return false;
        }

        if !content.is_size_valid() {
            warn!("Refusing to send oversized content ({} bytes)", content.size);
            return false;
        }

        let frame = Frame {
            header: Header {
                target,
                source: self.address,
                rssi: 0,
            },
            content: *content,
        };

        match self.tx_queue.push_back(frame) {
            Ok(()) => true,
            Err(_) => {
                debug!("Outbound queue full, frame to 0x{:02X} rejected", target);
                false
            }
        }
    }

    /// Take the oldest received frame, if any
    pub fn receive_packet(&mut self) -> Option<Frame> {
        self.rx_queue.pop_front()
    }

    /// Handle a power event
    ///
    /// The radio mode is forced immediately, whatever the current state. A
    /// frame being transmitted at that moment is abandoned; one still waiting
    /// in the outbound queue is kept and sent after wakeup.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Sleep => {
                info!("Entering sleep");
                self.radio.set_mode(RadioMode::Sleep);
                self.asleep = true;
            }
            Event::Wakeup => {
                info!("Exiting sleep");
                self.radio.set_mode(RadioMode::Standby);
                self.asleep = false;
            }
        }
        self.state = TransceiverState::Listening { armed: false };
    }

    /// Discard any frame waiting in the outbound queue
    pub fn flush(&mut self) {
        self.tx_queue.clear();
    }

    /// Whether a transmission is pending or in progress
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, TransceiverState::Listening { .. }) || !self.tx_queue.is_empty()
    }

    /// Whether the radio has been put to sleep
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Address stamped as source on outgoing frames
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn statistics(&self) -> TransceiverStatistics {
        self.statistics
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    fn listen(&mut self) -> TransceiverState {
        if self.radio.is_payload_ready() {
            self.radio.set_mode(RadioMode::Standby);
            self.handle_payload();
            TransceiverState::Listening { armed: false }
        } else if self.radio.is_rx_timeout_flag_set() {
            warn!("Rx timeout!");
            self.radio.restart_rx();
            TransceiverState::Listening { armed: true }
        } else if !self.tx_queue.is_empty() {
            // Standby before touching the FIFO
            self.radio.set_mode(RadioMode::Standby);
            TransceiverState::SendInit
        } else {
            TransceiverState::Listening { armed: true }
        }
    }

    fn handle_payload(&mut self) {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let count = self.radio.read_from_fifo(&mut buffer);
        let rssi = self.radio.rssi();

        let mut frame = match decode_frame(&buffer[..count]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to handle packet: {}", e);
                self.radio.clear_fifo();
                self.statistics.rx_invalid += 1;
                return;
            }
        };
        frame.header.rssi = rssi;

        debug!(
            "<PCK> {},{},{},{},{},{}",
            frame.header.target,
            frame.header.source,
            frame.header.rssi,
            frame.content.timestamp,
            frame.content.packet_type,
            frame.content.size
        );

        if self.rx_queue.push_back(frame).is_err() {
            warn!(
                "Inbound queue full, dropping frame from 0x{:02X}",
                frame.header.source
            );
            self.statistics.rx_dropped += 1;
        } else {
            self.statistics.received += 1;
        }
    }

    fn write_packet(&mut self) -> TransceiverState {
        if !self.radio.is_mode_ready() {
            return TransceiverState::SendWaitModeReady;
        }

        match self.tx_queue.pop_front() {
            Some(frame) => {
                let encoded = encode_frame(&frame);
                self.radio.write_to_fifo(&encoded);
                self.radio.set_mode(RadioMode::Transmitter);
                TransceiverState::Sending
            }
            None => {
                warn!("No packets available, aborting TX sequence.");
                self.statistics.tx_aborted += 1;
                self.radio.set_mode(RadioMode::Receiver);
                TransceiverState::Listening { armed: true }
            }
        }
    }

    fn wait_for_packet_sent(&mut self) -> TransceiverState {
        if !self.radio.is_packet_sent() {
            return TransceiverState::Sending;
        }

        self.statistics.transmitted += 1;
        self.radio.set_mode(RadioMode::Receiver);
        TransceiverState::Listening { armed: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::protocol::{PacketType, Timestamp, CONTENT_DATA_SIZE};
    use crate::radio::mocks::FakeRadio;
    use crate::radio::AES_KEY_SIZE;

    const STATION: Address = 0xAA;
    const NODE: Address = 0x80;

    fn settings() -> RadioSettings {
        RadioSettings {
            carrier_frequency_hz: 868_000_000,
            bit_rate: 4800,
            frequency_deviation_hz: 5000,
            preamble_length: 8,
            power_level: 28,
            rssi_threshold: -85,
            network_id: vec![1, 2, 3, 4, 5, 6],
            node_address: STATION,
            broadcast_address: 0xFF,
            aes_key: [0x42; AES_KEY_SIZE],
        }
    }

    fn transceiver() -> Transceiver<FakeRadio> {
        Transceiver::new(FakeRadio::new(), &settings())
    }

    fn content(payload: &[u8]) -> Content {
        Content::new(PacketType::Data, Timestamp::ZERO, payload).unwrap()
    }

    fn inbound_bytes(source: Address, payload: &[u8]) -> Vec<u8> {
        let frame = Frame {
            header: Header {
                target: STATION,
                source,
                rssi: 0,
            },
            content: Content::new(PacketType::Reading, Timestamp::ZERO, payload).unwrap(),
        };
        encode_frame(&frame).to_vec()
    }

    /// Run updates until the transceiver is listening with nothing pending
    fn drain(transceiver: &mut Transceiver<FakeRadio>) {
        for _ in 0..10 {
            transceiver.update();
            if !transceiver.is_busy() {
                return;
            }
        }
        panic!("Transceiver did not return to listening");
    }

    #[test]
    fn test_new_configures_radio() {
        let transceiver = transceiver();
        assert_eq!(transceiver.radio().settings, Some(settings()));
        assert_eq!(transceiver.radio().fifo_clears, 1);
        assert_eq!(transceiver.address(), STATION);
        assert!(transceiver.radio().modes.is_empty());
    }

    #[test]
    fn test_first_update_arms_receiver_once() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.update();
        transceiver.update();
        assert_eq!(transceiver.radio().modes, vec![RadioMode::Receiver]);
    }

    #[test]
    fn test_round_trip_mode_sequence() {
        let mut transceiver = transceiver();
        transceiver.update();

        assert!(transceiver.send_packet(NODE, &content(&[1, 2, 3])));
        drain(&mut transceiver);

        assert_eq!(
            transceiver.radio().modes,
            vec![
                RadioMode::Receiver,
                RadioMode::Standby,
                RadioMode::Transmitter,
                RadioMode::Receiver,
            ]
        );
        assert_eq!(transceiver.statistics().transmitted, 1);
    }

    #[test]
    fn test_transmitted_frame_carries_station_address() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[9, 8, 7]));
        drain(&mut transceiver);

        let written = &transceiver.radio().written;
        assert_eq!(written.len(), 1);

        let frame = decode_frame(&written[0]).unwrap();
        assert_eq!(frame.header.source, STATION);
        assert_eq!(frame.header.target, NODE);
        assert_eq!(frame.content.payload(), &[9, 8, 7]);
    }

    #[test]
    fn test_send_waits_for_mode_ready() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[1]));
        transceiver.radio_mut().mode_ready = false;

        for _ in 0..5 {
            transceiver.update();
        }
        assert_eq!(
            transceiver.radio().modes,
            vec![RadioMode::Receiver, RadioMode::Standby]
        );
        assert!(transceiver.radio().written.is_empty());

        transceiver.radio_mut().mode_ready = true;
        transceiver.update();
        assert_eq!(transceiver.radio().written.len(), 1);
        assert_eq!(
            transceiver.radio().current_mode(),
            Some(RadioMode::Transmitter)
        );
    }

    #[test]
    fn test_sending_waits_for_packet_sent() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[1]));
        transceiver.radio_mut().packet_sent = false;

        for _ in 0..6 {
            transceiver.update();
        }
        assert_eq!(
            transceiver.radio().current_mode(),
            Some(RadioMode::Transmitter)
        );
        assert!(transceiver.is_busy());

        transceiver.radio_mut().packet_sent = true;
        transceiver.update();
        assert_eq!(transceiver.radio().current_mode(), Some(RadioMode::Receiver));
        assert!(!transceiver.is_busy());
    }

    #[test]
    fn test_send_packet_rejects_oversized_content() {
        let mut transceiver = transceiver();
        let mut oversized = content(&[]);
        oversized.size = (CONTENT_DATA_SIZE + 1) as u8;

        // Empty queue
        assert!(!transceiver.send_packet(NODE, &oversized));

        // Occupied queue
        assert!(transceiver.send_packet(NODE, &content(&[1])));
        assert!(!transceiver.send_packet(NODE, &oversized));
    }

    #[test]
    fn test_send_packet_rejects_reserved_target() {
        let mut transceiver = transceiver();
        assert!(!transceiver.send_packet(INVALID_ADDRESS, &content(&[1])));
        assert!(!transceiver.is_busy());
    }

    #[test]
    fn test_second_send_before_drain_is_rejected() {
        let mut transceiver = transceiver();
        transceiver.update();

        assert!(transceiver.send_packet(NODE, &content(&[1])));
        assert!(!transceiver.send_packet(NODE, &content(&[2])));

        drain(&mut transceiver);
        assert!(transceiver.send_packet(NODE, &content(&[3])));
    }

    #[test]
    fn test_receive_packet_empty() {
        let mut transceiver = transceiver();
        assert!(transceiver.receive_packet().is_none());
    }

    #[test]
    fn test_receive_frame() {
        let mut transceiver = transceiver();
        transceiver.update();

        transceiver
            .radio_mut()
            .inject(&inbound_bytes(NODE, &[4, 5, 6]), -72);
        transceiver.update();

        assert_eq!(
            transceiver.radio().modes,
            vec![RadioMode::Receiver, RadioMode::Standby]
        );

        let frame = transceiver.receive_packet().unwrap();
        assert_eq!(frame.header.source, NODE);
        assert_eq!(frame.header.rssi, -72);
        assert_eq!(frame.content.payload(), &[4, 5, 6]);
        assert!(transceiver.receive_packet().is_none());

        // Receiver is re-armed on the following tick
        transceiver.update();
        assert_eq!(transceiver.radio().current_mode(), Some(RadioMode::Receiver));
    }

    #[test]
    fn test_full_inbound_queue_rejects_newest() {
        let mut transceiver = transceiver();
        transceiver.update();

        transceiver.radio_mut().inject(&inbound_bytes(0x80, &[1]), -50);
        transceiver.update();
        transceiver.update();
        transceiver.radio_mut().inject(&inbound_bytes(0x81, &[2]), -50);
        transceiver.update();

        assert_eq!(transceiver.statistics().received, 1);
        assert_eq!(transceiver.statistics().rx_dropped, 1);

        let frame = transceiver.receive_packet().unwrap();
        assert_eq!(frame.header.source, 0x80);
        assert!(transceiver.receive_packet().is_none());
    }

    #[test]
    fn test_invalid_payload_is_discarded() {
        let mut transceiver = transceiver();
        transceiver.update();

        transceiver.radio_mut().inject(&[3, 1, 2, 3], -50);
        transceiver.update();

        assert!(transceiver.receive_packet().is_none());
        assert_eq!(transceiver.statistics().rx_invalid, 1);
        assert_eq!(transceiver.radio().fifo_clears, 2);
    }

    #[test]
    fn test_rx_timeout_restarts_receiver() {
        let mut transceiver = transceiver();
        transceiver.update();

        transceiver.radio_mut().rx_timeout = true;
        transceiver.update();

        assert_eq!(transceiver.radio().rx_restarts, 1);
        assert_eq!(transceiver.radio().modes, vec![RadioMode::Receiver]);
    }

    #[test]
    fn test_reception_takes_priority_over_sending() {
        let mut transceiver = transceiver();
        transceiver.update();

        transceiver.send_packet(NODE, &content(&[1]));
        transceiver.radio_mut().inject(&inbound_bytes(NODE, &[2]), -40);
        transceiver.update();

        assert!(transceiver.receive_packet().is_some());
        assert!(transceiver.radio().written.is_empty());

        drain(&mut transceiver);
        assert_eq!(transceiver.radio().written.len(), 1);
    }

    #[test]
    fn test_abort_when_outbound_queue_flushed() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[1]));
        transceiver.radio_mut().mode_ready = false;

        transceiver.update(); // Standby, SendInit
        transceiver.update(); // SendWaitModeReady
        transceiver.flush();
        transceiver.radio_mut().mode_ready = true;
        transceiver.update();

        assert!(transceiver.radio().written.is_empty());
        assert_eq!(transceiver.statistics().tx_aborted, 1);
        assert_eq!(
            transceiver.radio().modes,
            vec![RadioMode::Receiver, RadioMode::Standby, RadioMode::Receiver]
        );
        assert!(!transceiver.is_busy());
    }

    #[test]
    fn test_sleep_abandons_send_in_progress() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[1]));
        transceiver.radio_mut().packet_sent = false;
        for _ in 0..3 {
            transceiver.update();
        }
        assert_eq!(
            transceiver.radio().current_mode(),
            Some(RadioMode::Transmitter)
        );

        transceiver.handle_event(Event::Sleep);
        assert!(transceiver.is_asleep());
        assert_eq!(transceiver.radio().current_mode(), Some(RadioMode::Sleep));

        // Updates while asleep do nothing
        let modes_before = transceiver.radio().modes.len();
        transceiver.update();
        transceiver.update();
        assert_eq!(transceiver.radio().modes.len(), modes_before);

        transceiver.handle_event(Event::Wakeup);
        assert_eq!(transceiver.radio().current_mode(), Some(RadioMode::Standby));
        transceiver.update();
        assert_eq!(transceiver.radio().current_mode(), Some(RadioMode::Receiver));
        assert_eq!(transceiver.statistics().transmitted, 0);
        assert!(!transceiver.is_busy());
    }

    #[test]
    fn test_queued_frame_survives_sleep() {
        let mut transceiver = transceiver();
        transceiver.update();
        transceiver.send_packet(NODE, &content(&[1]));

        transceiver.handle_event(Event::Sleep);
        transceiver.handle_event(Event::Wakeup);
        drain(&mut transceiver);

        assert_eq!(transceiver.radio().written.len(), 1);
    }
}
