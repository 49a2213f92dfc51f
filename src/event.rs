//! # Power Events
//!
//! Asynchronous events raised outside the scheduler loop and delivered to the
//! link stack.

/// Power state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Put the radio to sleep now; a send in progress is abandoned
    Sleep,
    /// Bring the radio back to standby
    Wakeup,
}
