//! # Station Module
//!
//! The base station context: the link stack, the node registry and the packet
//! handlers wired together.
//!
//! [`BaseStation::tick`] is the body of the scheduler loop. It advances the
//! transceiver by one step and dispatches at most one received frame.

pub mod handlers;

use tracing::info;

use crate::clock::MonotonicClock;
use crate::com::{Com, ComStatistics};
use crate::config::Config;
use crate::error::Result;
use crate::error_log::ErrorLog;
use crate::event::Event;
use crate::node::{Node, NodeRegistry};
use crate::packet::protocol::{node_address, Address, PacketType};
use crate::radio::RadioLink;
use crate::rtc::Rtc;
use crate::telemetry::NodeLogger;
use crate::transceiver::{Transceiver, TransceiverStatistics};

/// Application state handed to packet handlers
pub struct StationState {
    pub registry: NodeRegistry,
    pub clock: Box<dyn MonotonicClock>,
    /// Interval at which nodes are expected to report
    pub report_interval_ms: u32,
    pub telemetry: Option<NodeLogger>,
}

impl std::fmt::Debug for StationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationState")
            .field("registry", &self.registry)
            .field("report_interval_ms", &self.report_interval_ms)
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

/// Base station
#[derive(Debug)]
pub struct BaseStation<R: RadioLink> {
    com: Com<R, StationState>,
    state: StationState,
}

impl<R: RadioLink> BaseStation<R> {
    /// Build the station from configuration
    ///
    /// Configures the radio, registers `config.nodes.count` nodes and the
    /// `Reading` handler.
    ///
    /// # Errors
    ///
    /// Returns error if the telemetry directory cannot be created
    ///
    /// # Panics
    ///
    /// Panics if the node addressing in `config` is invalid; [`Config::load`]
    /// rejects such configurations
    pub fn new(
        config: &Config,
        radio: R,
        clock: Box<dyn MonotonicClock>,
        rtc: Box<dyn Rtc>,
        error_log: Box<dyn ErrorLog>,
    ) -> Result<Self> {
        let transceiver = Transceiver::new(radio, &config.radio_settings());
        let mut com = Com::new(transceiver, rtc, error_log);
        com.set_packet_handler(handlers::handle_reading_packet::<R>, PacketType::Reading);

        let mut registry = NodeRegistry::new();
        for index in 0..config.nodes.count {
            registry.add(Node::new(node_address(config.nodes.address_base, index)));
        }

        let state = StationState {
            registry,
            clock,
            report_interval_ms: config.report_interval_ms(),
            telemetry: NodeLogger::from_config(&config.telemetry)?,
        };

        info!(
            "Base station 0x{:02X} started with {} nodes",
            config.station.address,
            state.registry.len()
        );

        Ok(Self { com, state })
    }

    /// Run one scheduler step
    pub fn tick(&mut self) {
        self.com.transceiver_mut().update();
        self.com.update(&mut self.state);
    }

    /// Forward a power event to the transceiver
    pub fn handle_event(&mut self, event: Event) {
        self.com.transceiver_mut().handle_event(event);
    }

    /// Send a frame to `target`
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if the frame was queued
    pub fn send(&mut self, target: Address, packet_type: PacketType, data: &[u8]) -> bool {
        self.com.send(target, packet_type, data)
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.state.registry
    }

    /// Whether `node` has reported within the last two report intervals
    pub fn is_node_active(&self, node: &Node) -> bool {
        node.is_active(self.state.clock.as_ref(), self.state.report_interval_ms)
    }

    pub fn com(&self) -> &Com<R, StationState> {
        &self.com
    }

    pub fn com_statistics(&self) -> ComStatistics {
        self.com.statistics()
    }

    pub fn transceiver_statistics(&self) -> TransceiverStatistics {
        self.com.transceiver().statistics()
    }

    /// Print link statistics and the stored error log
    pub fn dump_error_log(&self) {
        self.com.dump_error_log();
    }

    /// Log a status line per node
    pub fn log_status(&self) {
        for node in self.state.registry.iter() {
            info!(
                "Node 0x{:02X}: {} rssi={} battery={} mV{} temperature={} humidity={}",
                node.id(),
                if self.is_node_active(node) { "active" } else { "inactive" },
                node.rssi(),
                node.battery_voltage(),
                if node.is_battery_ok() { "" } else { " (low)" },
                node.temperature().value,
                node.humidity().value
            );
        }
        info!(
            "Link: {:?} {:?}",
            self.com.statistics(),
            self.com.transceiver().statistics()
        );
    }
}
