//! # Sensor Station Library
//!
//! Radio link stack of the base station in a star-topology network of
//! battery-powered sensor nodes.
//!
//! The station listens for readings from up to three field nodes over a
//! half-duplex packet radio, keeps the latest state of each node, and answers
//! every reading with the current time so the nodes stay synchronized.
//!
//! Layers, bottom up:
//! - [`radio`]: the radio boundary and a field-node simulator
//! - [`transceiver`]: the listen/send state machine with single-slot queues
//! - [`com`]: per-type dispatch of received frames and timestamped sending
//! - [`node`] and [`station`]: node state and the handlers that update it

pub mod clock;
pub mod com;
pub mod config;
pub mod error;
pub mod error_log;
pub mod event;
pub mod node;
pub mod packet;
pub mod radio;
pub mod rtc;
pub mod station;
pub mod telemetry;
pub mod transceiver;
