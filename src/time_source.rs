//! Time source abstraction for real and simulated time.
//!
//! The controller needs two kinds of time: a monotonic millisecond counter for
//! elapsed-time math (debounce windows, stop delay, shutoff countdown) and the
//! wall-clock hour for the activation time window. Both come from a [`Clock`]
//! injected at construction, so every timing decision can be driven from a
//! test or a replayed scenario without waiting for real time to pass.
//!
//! The millisecond counter is a `u32` and wraps roughly every 49.7 days.
//! Consumers compute elapsed time with `wrapping_sub`, which stays correct
//! across a single wrap.

use chrono::{Local, Timelike};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const MILLIS_PER_HOUR: u32 = 3_600_000;
const MILLIS_PER_DAY: u32 = 24 * MILLIS_PER_HOUR;

/// Source of monotonic and wall-clock time.
pub trait Clock {
    /// Milliseconds since an arbitrary origin; wraps at `u32::MAX`.
    fn now_millis(&self) -> u32;

    /// Current local hour of day (0-23), or `None` when wall-clock time is
    /// not available (e.g. no time sync yet).
    fn current_hour(&self) -> Option<u8>;

    /// Block for `ms` milliseconds (or advance simulated time by that much).
    fn sleep_ms(&self, ms: u32);
}

/// Real time: monotonic counter from process start, hour from the local clock.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u32 {
        // Truncation is the documented wrap-around behaviour.
        self.origin.elapsed().as_millis() as u32
    }

    fn current_hour(&self) -> Option<u8> {
        Some(Local::now().hour() as u8)
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[derive(Debug)]
struct SimulatedState {
    millis: Cell<u32>,
    /// Milliseconds since local midnight, `None` while wall time is unknown.
    wall_ms: Cell<Option<u32>>,
}

/// Manually driven clock for tests and scenario replay.
///
/// Clones share the same underlying time, so a classifier, an engine and a
/// test harness can all hold a handle and observe the same advances.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    state: Rc<SimulatedState>,
}

impl SimulatedClock {
    /// Create a clock at `start_ms` with no wall-clock time.
    pub fn new(start_ms: u32) -> Self {
        Self {
            state: Rc::new(SimulatedState {
                millis: Cell::new(start_ms),
                wall_ms: Cell::new(None),
            }),
        }
    }

    /// Create a clock at `start_ms` whose wall clock reads `hour:00`.
    pub fn with_hour(start_ms: u32, hour: u8) -> Self {
        let clock = Self::new(start_ms);
        clock.set_hour(hour);
        clock
    }

    /// Advance both the monotonic counter and the wall clock.
    pub fn advance(&self, ms: u32) {
        let state = &self.state;
        state.millis.set(state.millis.get().wrapping_add(ms));
        if let Some(wall) = state.wall_ms.get() {
            let next = (u64::from(wall) + u64::from(ms)) % u64::from(MILLIS_PER_DAY);
            state.wall_ms.set(Some(next as u32));
        }
    }

    /// Jump the monotonic counter to an absolute value without touching the wall clock.
    pub fn set_millis(&self, ms: u32) {
        self.state.millis.set(ms);
    }

    /// Set the wall clock to the start of `hour` (taken modulo 24).
    pub fn set_hour(&self, hour: u8) {
        let hour = u32::from(hour % 24);
        self.state.wall_ms.set(Some(hour * MILLIS_PER_HOUR));
    }

    /// Set the wall clock to an exact time of day.
    pub fn set_time_of_day(&self, hour: u8, minute: u8, second: u8) {
        let ms = (u32::from(hour % 24) * 3600 + u32::from(minute % 60) * 60 + u32::from(second % 60))
            * 1000;
        self.state.wall_ms.set(Some(ms));
    }

    /// Drop wall-clock time, as if time sync had been lost.
    pub fn clear_wall_clock(&self) {
        self.state.wall_ms.set(None);
    }
}

impl Clock for SimulatedClock {
    fn now_millis(&self) -> u32 {
        self.state.millis.get()
    }

    fn current_hour(&self) -> Option<u8> {
        self.state
            .wall_ms
            .get()
            .map(|wall| (wall / MILLIS_PER_HOUR) as u8)
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(ms);
    }
}

/// Milliseconds elapsed from `since` to `now`, correct across one counter wrap.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}
