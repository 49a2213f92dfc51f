//! # Packet Module
//!
//! Wire format shared by the base station and the field nodes.
//!
//! This module handles:
//! - Frame, header and content types with fixed-capacity payloads
//! - Packet type enumeration and range checks
//! - Frame encoding/decoding with explicit field order
//! - Node report payload layout (little-endian)

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod report;
