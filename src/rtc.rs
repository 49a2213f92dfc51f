//! # Real-Time Clock
//!
//! Calendar time source used to timestamp outgoing frames.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use thiserror::Error;

use crate::packet::protocol::Timestamp;

/// RTC read failures
#[derive(Debug, Error)]
pub enum RtcError {
    /// The clock did not answer
    #[error("RTC not responding")]
    NotResponding,

    /// The clock answered with a time the frame format cannot carry
    #[error("RTC time out of range: {0}")]
    OutOfRange(String),
}

/// Calendar clock
#[cfg_attr(test, mockall::automock)]
pub trait Rtc {
    /// Read the current time
    fn current_time(&mut self) -> Result<Timestamp, RtcError>;
}

/// RTC backed by the host's local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRtc;

impl Rtc for SystemRtc {
    fn current_time(&mut self) -> Result<Timestamp, RtcError> {
        timestamp_from_datetime(&Local::now().naive_local())
    }
}

/// Convert a calendar time into a frame timestamp
///
/// # Errors
///
/// Returns `OutOfRange` for years outside 2000-2099
pub fn timestamp_from_datetime(datetime: &NaiveDateTime) -> Result<Timestamp, RtcError> {
    let year = datetime.year();
    if !(2000..=2099).contains(&year) {
        return Err(RtcError::OutOfRange(format!("year {}", year)));
    }

    Ok(Timestamp {
        year: (year - 2000) as u8,
        month: datetime.month() as u8,
        date: datetime.day() as u8,
        hour: datetime.hour() as u8,
        minute: datetime.minute() as u8,
        second: datetime.second() as u8,
    })
}
