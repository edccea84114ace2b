//! Millisecond tick sources for cooperative scanning.
//!
//! Ticks are `u32` milliseconds and wrap around after roughly 49.7 days.
//! Never compare two ticks with `<` or `>=` directly; use [deadline_reached] instead.

use std::fmt::Debug;
use std::time::Instant;

/// A monotonic, wrapping millisecond counter.
pub trait TickSource: Debug {
    /// Gets the current tick, in milliseconds.
    fn now_ms(&self) -> u32;
}

/// Tick source backed by [Instant], counting from its creation.
#[derive(Copy, Clone, Debug)]
pub struct MonotonicTicks {
    start: Instant,
}

impl MonotonicTicks {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound.
        self.start.elapsed().as_millis() as u32
    }
}

/// Checks whether `now` is at or past `deadline`, tolerating counter wraparound.
///
/// Valid as long as the two ticks are less than `i32::MAX` milliseconds apart.
pub fn deadline_reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) as i32 >= 0
}
