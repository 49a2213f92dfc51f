//! # Error Types
//!
//! Custom error types for the sensor station using `thiserror`.
//!
//! Only setup and I/O paths return these. Conditions on the radio path
//! (full queue, nothing received, unknown packet type) are reported as
//! `bool`/`Option` so the scheduler can simply try again on the next tick.

use thiserror::Error;

/// Main error type for the sensor station
#[derive(Debug, Error)]
pub enum StationError {
    /// Wire format errors
    #[error("Packet codec error: {0}")]
    Codec(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the sensor station
pub type Result<T> = std::result::Result<T, StationError>;
