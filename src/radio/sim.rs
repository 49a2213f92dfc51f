//! Simulated radio with in-process field nodes
//!
//! Stands in for the radio hardware when running the station on a host.
//! Each simulated node sends a `Reading` frame to the station once per report
//! interval, staggered so the nodes do not collide. `Time` frames sent by the
//! station are delivered to the addressed node, which adopts the time for its
//! following readings.
//!
//! Mode switches complete on the first [`RadioLink::is_mode_ready`] poll after
//! [`RadioLink::set_mode`], and a transmission completes as soon as the
//! transmitter is enabled.

use tracing::{debug, info, trace};

use super::{RadioLink, RadioMode, RadioSettings};
use crate::clock::MonotonicClock;
use crate::packet::decoder::decode_frame;
use crate::packet::encoder::encode_frame;
use crate::packet::protocol::{
    Address, Content, Frame, Header, PacketType, Timestamp, DEFAULT_STATION_ADDRESS, TIMESTAMP_SIZE,
};
use crate::packet::report::NodeReport;

/// Half the counter range; differences above this mean "not yet"
const HALF_RANGE_MS: u32 = u32::MAX / 2;

#[derive(Debug, Clone)]
struct SimulatedNode {
    address: Address,
    index: u32,
    due_at_ms: u32,
    sequence: u32,
    time: Timestamp,
}

impl SimulatedNode {
    /// Deterministic reading that drifts from one report to the next
    fn report(&self) -> NodeReport {
        let step = self.sequence.wrapping_add(self.index * 17);
        NodeReport {
            battery_voltage: 3000 - (step.wrapping_mul(7) % 900) as u16,
            battery_temperature: 15 + (step % 12) as i16,
            charging: step % 10 < 3,
            charger_connected: step % 10 < 4,
            humidity: 450 + (step.wrapping_mul(17) % 100) as i16,
            temperature: 150 + (step.wrapping_mul(13) % 60) as i16,
            sensor_valid: step % 16 != 15,
        }
    }

    fn rssi(&self) -> i8 {
        -50 - (self.index * 7) as i8 - (self.sequence % 5) as i8
    }
}

/// Radio simulator driving a set of virtual field nodes
#[derive(Debug)]
pub struct SimulatedRadio<C: MonotonicClock> {
    clock: C,
    settings: Option<RadioSettings>,
    report_interval_ms: u32,
    nodes: Vec<SimulatedNode>,
    mode: RadioMode,
    mode_ready: bool,
    rx_fifo: Vec<u8>,
    rx_rssi: i8,
    tx_fifo: Vec<u8>,
    packet_sent: bool,
    time_syncs: u32,
}

impl<C: MonotonicClock> SimulatedRadio<C> {
    /// Create a simulator for nodes at `node_addresses`
    ///
    /// # Arguments
    ///
    /// * `clock` - Uptime source deciding when readings are due
    /// * `node_addresses` - Addresses of the simulated nodes
    /// * `report_interval_ms` - Interval between readings of each node
    pub fn new(clock: C, node_addresses: &[Address], report_interval_ms: u32) -> Self {
        let now = clock.milliseconds();
        let slots = node_addresses.len() as u32 + 1;

        let nodes = node_addresses
            .iter()
            .enumerate()
            .map(|(i, &address)| {
                let index = i as u32;
                SimulatedNode {
                    address,
                    index,
                    due_at_ms: now.wrapping_add(report_interval_ms / slots * (index + 1)),
                    sequence: 0,
                    time: Timestamp::ZERO,
                }
            })
            .collect();

        Self {
            clock,
            settings: None,
            report_interval_ms,
            nodes,
            mode: RadioMode::Standby,
            mode_ready: true,
            rx_fifo: Vec::new(),
            rx_rssi: 0,
            tx_fifo: Vec::new(),
            packet_sent: false,
            time_syncs: 0,
        }
    }

    /// Number of `Time` frames delivered to simulated nodes
    pub fn time_syncs(&self) -> u32 {
        self.time_syncs
    }

    /// Time last delivered to the node at `address`
    pub fn node_time(&self, address: Address) -> Option<Timestamp> {
        self.nodes.iter().find(|n| n.address == address).map(|n| n.time)
    }

    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    fn station_address(&self) -> Address {
        self.settings
            .as_ref()
            .map(|s| s.node_address)
            .unwrap_or(DEFAULT_STATION_ADDRESS)
    }

    /// Load the FIFO with the next due reading, if any
    fn poll_nodes(&mut self) {
        if self.mode != RadioMode::Receiver || !self.rx_fifo.is_empty() {
            return;
        }

        let now = self.clock.milliseconds();
        let target = self.station_address();
        let interval = self.report_interval_ms;

        let Some(node) = self
            .nodes
            .iter_mut()
            .find(|n| now.wrapping_sub(n.due_at_ms) <= HALF_RANGE_MS)
        else {
            return;
        };

        let report = node.report().encode();
        let mut content = Content {
            timestamp: node.time,
            packet_type: PacketType::Reading.into(),
            size: report.len() as u8,
            ..Content::default()
        };
        content.data[..report.len()].copy_from_slice(&report);

        let frame = Frame {
            header: Header {
                target,
                source: node.address,
                rssi: 0,
            },
            content,
        };

        self.rx_rssi = node.rssi();
        node.sequence = node.sequence.wrapping_add(1);
        node.due_at_ms = node.due_at_ms.wrapping_add(interval);

        trace!("Simulated node 0x{:02X} sends reading", node.address);
        self.rx_fifo = encode_frame(&frame).to_vec();
    }

    fn transmit(&mut self) {
        let frame = match decode_frame(&self.tx_fifo) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Simulated air drops frame: {}", e);
                self.tx_fifo.clear();
                self.packet_sent = true;
                return;
            }
        };
        self.tx_fifo.clear();
        self.packet_sent = true;

        let Some(node) = self.nodes.iter_mut().find(|n| n.address == frame.header.target) else {
            debug!("No simulated node at 0x{:02X}", frame.header.target);
            return;
        };

        if frame.content.packet_type() == Some(PacketType::Time)
            && frame.content.payload().len() >= TIMESTAMP_SIZE
        {
            let mut bytes = [0u8; TIMESTAMP_SIZE];
            bytes.copy_from_slice(&frame.content.payload()[..TIMESTAMP_SIZE]);
            node.time = Timestamp::from_bytes(bytes);
            self.time_syncs += 1;
            trace!("Simulated node 0x{:02X} time set to {}", node.address, node.time);
        }
    }
}

impl<C: MonotonicClock> RadioLink for SimulatedRadio<C> {
    fn configure(&mut self, settings: &RadioSettings) {
        info!(
            "Simulated radio configured: {} nodes, {} Hz, station 0x{:02X}",
            self.nodes.len(),
            settings.carrier_frequency_hz,
            settings.node_address
        );
        self.settings = Some(settings.clone());
    }

    fn set_mode(&mut self, mode: RadioMode) {
        self.mode = mode;
        self.mode_ready = false;

        match mode {
            RadioMode::Transmitter => self.transmit(),
            _ => self.packet_sent = false,
        }
    }

    fn is_mode_ready(&mut self) -> bool {
        // Switch completes on the first poll
        let ready = self.mode_ready;
        self.mode_ready = true;
        ready
    }

    fn is_payload_ready(&mut self) -> bool {
        self.poll_nodes();
        self.mode == RadioMode::Receiver && !self.rx_fifo.is_empty()
    }

    fn is_rx_timeout_flag_set(&mut self) -> bool {
        false
    }

    fn is_packet_sent(&mut self) -> bool {
        self.packet_sent
    }

    fn read_from_fifo(&mut self, buffer: &mut [u8]) -> usize {
        let count = self.rx_fifo.len().min(buffer.len());
        buffer[..count].copy_from_slice(&self.rx_fifo[..count]);
        self.rx_fifo.clear();
        count
    }

    fn write_to_fifo(&mut self, data: &[u8]) {
        self.tx_fifo.extend_from_slice(data);
    }

    fn clear_fifo(&mut self) {
        self.rx_fifo.clear();
        self.tx_fifo.clear();
    }

    fn rssi(&mut self) -> i8 {
        self.rx_rssi
    }

    fn restart_rx(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TickClock;
    use crate::packet::protocol::MAX_FRAME_SIZE;
    use crate::radio::AES_KEY_SIZE;

    const INTERVAL_MS: u32 = 10_000;

    fn settings() -> RadioSettings {
        RadioSettings {
            carrier_frequency_hz: 868_000_000,
            bit_rate: 4800,
            frequency_deviation_hz: 5000,
            preamble_length: 8,
            power_level: 28,
            rssi_threshold: -85,
            network_id: vec![0xAA, 0xBB],
            node_address: 0xAA,
            broadcast_address: 0xFF,
            aes_key: [1; AES_KEY_SIZE],
        }
    }

    fn create_radio(clock: &TickClock) -> SimulatedRadio<TickClock> {
        let mut radio = SimulatedRadio::new(clock.clone(), &[0x80, 0x81], INTERVAL_MS);
        radio.configure(&settings());
        radio
    }

    fn read_frame(radio: &mut SimulatedRadio<TickClock>) -> Frame {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let count = radio.read_from_fifo(&mut buffer);
        decode_frame(&buffer[..count]).unwrap()
    }

    #[test]
    fn test_no_reading_before_due() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        radio.set_mode(RadioMode::Receiver);
        assert!(!radio.is_payload_ready());
    }

    #[test]
    fn test_readings_are_staggered() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        radio.set_mode(RadioMode::Receiver);

        clock.advance(INTERVAL_MS / 3);
        assert!(radio.is_payload_ready());
        let frame = read_frame(&mut radio);
        assert_eq!(frame.header.source, 0x80);
        assert_eq!(frame.header.target, 0xAA);
        assert_eq!(frame.content.packet_type(), Some(PacketType::Reading));
        assert!(NodeReport::decode(frame.content.payload()).is_ok());

        assert!(!radio.is_payload_ready());

        clock.advance(INTERVAL_MS / 3);
        assert!(radio.is_payload_ready());
        assert_eq!(read_frame(&mut radio).header.source, 0x81);

        clock.advance(INTERVAL_MS);
        assert!(radio.is_payload_ready());
        assert_eq!(read_frame(&mut radio).header.source, 0x80);
    }

    #[test]
    fn test_nothing_received_outside_receiver_mode() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        radio.set_mode(RadioMode::Standby);
        clock.advance(INTERVAL_MS);
        assert!(!radio.is_payload_ready());
    }

    #[test]
    fn test_mode_ready_after_first_poll() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        radio.set_mode(RadioMode::Standby);
        assert!(!radio.is_mode_ready());
        assert!(radio.is_mode_ready());
    }

    #[test]
    fn test_time_frame_syncs_node() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        let time = Timestamp {
            year: 26,
            month: 10,
            date: 19,
            hour: 8,
            minute: 0,
            second: 1,
        };
        let frame = Frame {
            header: Header {
                target: 0x81,
                source: 0xAA,
                rssi: 0,
            },
            content: Content::new(PacketType::Time, time, &time.to_bytes()).unwrap(),
        };

        radio.set_mode(RadioMode::Standby);
        radio.write_to_fifo(&encode_frame(&frame));
        assert!(!radio.is_packet_sent());
        radio.set_mode(RadioMode::Transmitter);
        assert!(radio.is_packet_sent());

        assert_eq!(radio.time_syncs(), 1);
        assert_eq!(radio.node_time(0x81), Some(time));
        assert_eq!(radio.node_time(0x80), Some(Timestamp::ZERO));

        // The next reading from that node carries its new time
        radio.set_mode(RadioMode::Receiver);
        clock.advance(2 * INTERVAL_MS / 3);
        assert!(radio.is_payload_ready());
        let first = read_frame(&mut radio);
        assert_eq!(first.header.source, 0x80);
        assert!(radio.is_payload_ready());
        let second = read_frame(&mut radio);
        assert_eq!(second.header.source, 0x81);
        assert_eq!(second.content.timestamp, time);
    }

    #[test]
    fn test_transmit_garbage_completes() {
        let clock = TickClock::new();
        let mut radio = create_radio(&clock);
        radio.write_to_fifo(&[1, 2, 3]);
        radio.set_mode(RadioMode::Transmitter);
        assert!(radio.is_packet_sent());
        assert_eq!(radio.time_syncs(), 0);
    }
}
