//! # Monotonic Clock
//!
//! Millisecond uptime counter used for node freshness.
//!
//! The counter is advanced by a periodic tick source (a timer interrupt on
//! hardware, a tokio interval task in the binary) and read atomically by the
//! scheduler. Tests advance it by hand.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Source of monotonic milliseconds
pub trait MonotonicClock {
    /// Current uptime in milliseconds; wraps after ~49 days
    fn milliseconds(&self) -> u32;

    /// Milliseconds elapsed since `since_ms`, correct across one wrap-around
    fn time_difference(&self, since_ms: u32) -> u32 {
        self.milliseconds().wrapping_sub(since_ms)
    }
}

/// Shared tick counter
///
/// Clones share the same counter, so the tick source and the readers can each
/// hold one.
///
/// # Examples
///
/// ```
/// use sensor_station::clock::{MonotonicClock, TickClock};
///
/// let clock = TickClock::new();
/// let driver = clock.clone();
/// driver.advance(250);
/// assert_eq!(clock.milliseconds(), 250);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TickClock {
    counter: Arc<AtomicU32>,
}

impl TickClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `ms`
    pub fn starting_at(ms: u32) -> Self {
        Self {
            counter: Arc::new(AtomicU32::new(ms)),
        }
    }

    /// Advance the counter, wrapping on overflow
    pub fn advance(&self, ms: u32) {
        // fetch_add wraps on overflow
        self.counter.fetch_add(ms, Ordering::AcqRel);
    }

    /// Force the counter to `ms`
    pub fn set(&self, ms: u32) {
        self.counter.store(ms, Ordering::Release);
    }
}

impl MonotonicClock for TickClock {
    fn milliseconds(&self) -> u32 {
        self.counter.load(Ordering::Acquire)
    }
}
