//! In-process model of the PWM floodlight driver.
//!
//! Brightness is 0-255; the lamp counts as on whenever brightness is non-zero.
//! The PWM duty written for a brightness is scaled to the configured resolution.
//! Every write is counted so simulations and tests can check how often the
//! output was actually commanded.

use super::Actuator;
use crate::constants::FADE_STEPS;
use crate::time_source::Clock;

/// Floodlight state plus write accounting.
pub struct Lamp {
    brightness: u8,
    max_duty: u16,
    writes: u32,
    clock: Option<Box<dyn Clock>>,
}

impl Lamp {
    /// An 8-bit PWM lamp; fades complete instantly.
    pub fn new() -> Self {
        Self::with_resolution(8)
    }

    /// A lamp with a `bits`-bit PWM channel (clamped to 1-16).
    pub fn with_resolution(bits: u8) -> Self {
        let bits = bits.clamp(1, 16);
        Self {
            brightness: 0,
            max_duty: ((1u32 << bits) - 1) as u16,
            writes: 0,
            clock: None,
        }
    }

    /// Pace fades on `clock` instead of completing them instantly.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Number of output writes since creation.
    pub fn write_count(&self) -> u32 {
        self.writes
    }

    /// PWM duty currently applied.
    pub fn duty(&self) -> u16 {
        self.brightness_to_duty(self.brightness)
    }

    fn brightness_to_duty(&self, brightness: u8) -> u16 {
        (u32::from(brightness) * u32::from(self.max_duty) / 255) as u16
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
        self.writes = self.writes.saturating_add(1);
    }
}

impl Default for Lamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Actuator for Lamp {
    fn turn_on(&mut self, brightness: u8) {
        self.set_brightness(brightness);
    }

    fn turn_off(&mut self) {
        self.set_brightness(0);
    }

    fn is_on(&self) -> bool {
        self.brightness > 0
    }

    fn fade_to(&mut self, target: u8, duration_ms: u32) {
        let start = i32::from(self.brightness);
        let range = i32::from(target) - start;
        if range == 0 {
            return;
        }

        let steps = FADE_STEPS as i32;
        let step_delay = duration_ms / FADE_STEPS;
        for i in 1..=steps {
            let level = (start + range * i / steps).clamp(0, 255) as u8;
            self.set_brightness(level);
            if let Some(clock) = &self.clock
                && step_delay > 0
            {
                clock.sleep_ms(step_delay);
            }
        }

        if self.brightness != target {
            self.set_brightness(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::SimulatedClock;

    #[test]
    fn test_on_off_tracks_brightness() {
        let mut lamp = Lamp::new();
        assert!(!lamp.is_on());
        lamp.turn_on(128);
        assert!(lamp.is_on());
        assert_eq!(lamp.brightness(), 128);
        lamp.turn_off();
        assert!(!lamp.is_on());
        assert_eq!(lamp.write_count(), 2);
    }

    #[test]
    fn test_turn_on_zero_is_off() {
        let mut lamp = Lamp::new();
        lamp.turn_on(0);
        assert!(!lamp.is_on());
    }

    #[test]
    fn test_fade_lands_on_target() {
        let mut lamp = Lamp::new();
        lamp.fade_to(200, 500);
        assert_eq!(lamp.brightness(), 200);
        assert_eq!(lamp.write_count(), FADE_STEPS);

        lamp.fade_to(7, 500);
        assert_eq!(lamp.brightness(), 7);
    }

    #[test]
    fn test_fade_to_current_level_is_noop() {
        let mut lamp = Lamp::new();
        lamp.turn_on(90);
        lamp.fade_to(90, 1000);
        assert_eq!(lamp.write_count(), 1);
    }

    #[test]
    fn test_fade_paced_on_clock() {
        let clock = SimulatedClock::new(0);
        let mut lamp = Lamp::new().with_clock(Box::new(clock.clone()));
        lamp.fade_to(255, 500);
        assert_eq!(clock.now_millis(), 500);
    }

    #[test]
    fn test_duty_scales_with_resolution() {
        let mut lamp = Lamp::with_resolution(10);
        lamp.turn_on(255);
        assert_eq!(lamp.duty(), 1023);
        lamp.turn_on(0);
        assert_eq!(lamp.duty(), 0);
    }
}
