//! # Error Log
//!
//! Persistent record of environmental faults.
//!
//! Entries survive until overwritten: when the log is full the oldest entry
//! is replaced. Faults logged here never stop the station; assertion failures
//! halt it instead (see the panic hook in the binary).

use heapless::HistoryBuffer;
use serde::Serialize;
use tracing::{error, info};

/// Number of entries kept before the oldest is overwritten
pub const ERROR_LOG_SIZE: usize = 32;

/// Fault codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ErrorCode {
    PowerOn = 1,
    AssertFail = 2,
    LowStack = 3,
    RtcFail = 4,
    CorruptConfig = 5,
    HighMcuTemperature = 6,
}

/// One logged fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    /// Sequence number, increasing across the log's lifetime
    pub id: u16,
    pub code: ErrorCode,
    /// Code-specific detail byte
    pub information: u8,
}

/// Fault log collaborator
#[cfg_attr(test, mockall::automock)]
pub trait ErrorLog {
    /// Append an entry
    fn log_error(&mut self, code: ErrorCode, information: u8);

    /// Print every stored entry
    fn dump(&self);
}

/// Error log held in a fixed-size ring
#[derive(Debug)]
pub struct MemoryErrorLog {
    entries: HistoryBuffer<ErrorEntry, ERROR_LOG_SIZE>,
    next_id: u16,
}

impl Default for MemoryErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryErrorLog {
    pub fn new() -> Self {
        Self {
            entries: HistoryBuffer::new(),
            next_id: 0,
        }
    }

    /// Stored entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.oldest_ordered()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }
}

impl ErrorLog for MemoryErrorLog {
    fn log_error(&mut self, code: ErrorCode, information: u8) {
        let entry = ErrorEntry {
            id: self.next_id,
            code,
            information,
        };
        self.next_id = self.next_id.wrapping_add(1);

        error!("Logged error {:?} (info {}) as entry {}", code, information, entry.id);
        self.entries.write(entry);
    }

    fn dump(&self) {
        info!("Error log: {} entries", self.len());
        for entry in self.entries() {
            info!("  #{} {:?} info={}", entry.id, entry.code, entry.information);
        }
    }
}
