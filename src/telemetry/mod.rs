//! # Telemetry Module
//!
//! Handles node telemetry logging to JSONL files with rotation.
//!
//! This module handles:
//! - Snapshotting node state each time a reading is received
//! - Formatting as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Managing file rotation (max N records per file)
//! - Retaining only last M files

pub mod logger;

pub use logger::NodeLogger;
