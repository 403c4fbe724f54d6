//! Pulse-window debouncing of the raw "above threshold" signal.
//!
//! A single spike never counts as motion. Motion is declared once
//! `pulse_count` qualifying samples, each at least [`PULSE_MIN_SPACING_MS`]
//! after the previously counted one, fall inside one contiguous window of
//! `window_ms`. It is cleared once no qualifying sample has been seen for more
//! than `stop_delay_ms`.
//!
//! The window is anchored at its first pulse; a pulse arriving after the window
//! has run out restarts it with a count of one rather than sliding it.

use super::MotionSettings;
use crate::constants::PULSE_MIN_SPACING_MS;
use crate::time_source::elapsed_ms;

/// Debounce state driven by one boolean per sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PulseWindow {
    window_start: Option<u32>,
    pulse_count: u32,
    last_pulse: Option<u32>,
    last_motion: Option<u32>,
    moving: bool,
}

impl PulseWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample classification taken at `now`; returns the debounced state.
    pub fn update(&mut self, qualifying: bool, now: u32, settings: &MotionSettings) -> bool {
        if qualifying {
            self.record_pulse(now, settings);
        } else {
            self.record_quiet(now, settings);
        }
        self.moving
    }

    fn record_pulse(&mut self, now: u32, settings: &MotionSettings) {
        self.last_motion = Some(now);

        match self.window_start {
            None => self.open_window(now),
            Some(start) if elapsed_ms(now, start) <= settings.window_ms => {
                let spaced = self
                    .last_pulse
                    .is_none_or(|last| elapsed_ms(now, last) >= PULSE_MIN_SPACING_MS);
                if spaced {
                    self.pulse_count = self.pulse_count.saturating_add(1);
                    self.last_pulse = Some(now);
                }
            }
            // Window ran out before the quota was reached.
            Some(_) => self.open_window(now),
        }

        if self.pulse_count >= settings.pulse_count {
            self.moving = true;
        }
    }

    fn record_quiet(&mut self, now: u32, settings: &MotionSettings) {
        if !self.moving
            && let Some(start) = self.window_start
            && elapsed_ms(now, start) > settings.window_ms
        {
            self.close_window();
        }

        if self.moving {
            let quiet_for = self
                .last_motion
                .map_or(u32::MAX, |last| elapsed_ms(now, last));
            if quiet_for > settings.stop_delay_ms {
                self.moving = false;
                self.close_window();
            }
        }
    }

    fn open_window(&mut self, now: u32) {
        self.window_start = Some(now);
        self.pulse_count = 1;
        self.last_pulse = Some(now);
    }

    fn close_window(&mut self) {
        self.window_start = None;
        self.pulse_count = 0;
    }

    /// Forget any partially counted window; the moving flag is kept.
    pub fn reset_pulses(&mut self) {
        self.close_window();
        self.last_pulse = None;
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Pulses counted in the current window.
    pub fn pulse_count(&self) -> u32 {
        self.pulse_count
    }

    /// Start of the open window, if any.
    pub fn window_start(&self) -> Option<u32> {
        self.window_start
    }

    /// Time of the most recent qualifying sample.
    pub fn last_motion(&self) -> Option<u32> {
        self.last_motion
    }
}
