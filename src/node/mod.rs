//! # Node Module
//!
//! Base station view of the field nodes.
//!
//! This module handles:
//! - Per-node battery, sensor and signal state
//! - Activity tracking against the node report interval
//! - The fixed-capacity node registry keyed by radio address

pub mod registry;
pub mod remote;

pub use registry::{NodeRegistry, MAX_NUMBER_OF_NODES};
pub use remote::{Battery, Node, SensorValue, LOW_BATTERY_LIMIT_MV};
