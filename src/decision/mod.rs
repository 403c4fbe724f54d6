//! Lighting decision engine.
//!
//! Combines darkness, motion and an optional hour-of-day window into a
//! three-state machine (`OFF`, `ON`, `COUNTDOWN`) that drives the floodlight.
//! The transition rules live in [`machine::step`] as a pure function; the
//! [`DecisionEngine`] applies its actions to the injected collaborators and
//! handles manual overrides. [`Controller`] ties a motion classifier, an
//! ambient light source and the engine into one poll per cycle.

pub mod controller;
pub mod engine;
pub mod machine;
pub mod window;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SHUTOFF_DELAY_MS, DEFAULT_TIME_WINDOW_END, DEFAULT_TIME_WINDOW_START,
};

pub use controller::Controller;
pub use engine::DecisionEngine;
pub use machine::{Action, step};
pub use window::{TimeWindow, WindowCheck};

/// Settings that govern automatic control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// How long the light stays on after conditions stop holding.
    pub shutoff_delay_ms: u32,
    /// Automatic control on/off. When off, cycles do nothing.
    pub auto_mode: bool,
    /// Treat it as always night.
    pub light_sensor_bypass: bool,
    /// Treat the mower as always moving.
    pub movement_bypass: bool,
    pub time_window_enabled: bool,
    /// Operate outside the configured hours instead of inside them.
    pub time_window_invert: bool,
    pub time_window_start: u8,
    pub time_window_end: u8,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            shutoff_delay_ms: DEFAULT_SHUTOFF_DELAY_MS,
            auto_mode: true,
            light_sensor_bypass: false,
            movement_bypass: false,
            time_window_enabled: false,
            time_window_invert: false,
            time_window_start: DEFAULT_TIME_WINDOW_START,
            time_window_end: DEFAULT_TIME_WINDOW_END,
        }
    }
}

impl DecisionConfig {
    pub fn time_window(&self) -> TimeWindow {
        TimeWindow {
            enabled: self.time_window_enabled,
            invert: self.time_window_invert,
            start: self.time_window_start,
            end: self.time_window_end,
        }
    }
}

/// State of the automatic control machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionState {
    #[default]
    Off,
    On,
    /// Light still on, switching off once the shutoff delay has passed.
    Countdown { since: u32 },
}

impl DecisionState {
    pub fn name(&self) -> &'static str {
        match self {
            DecisionState::Off => "OFF",
            DecisionState::On => "ON",
            DecisionState::Countdown { .. } => "COUNTDOWN",
        }
    }
}

/// Which control path produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Auto,
    Manual,
    On,
    Off,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMode::Auto => "auto",
            ControlMode::Manual => "manual",
            ControlMode::On => "on",
            ControlMode::Off => "off",
        }
    }
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sensor snapshot taken for one decision cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub is_night: bool,
    /// Only used to annotate events.
    pub lux: f32,
    pub moving: bool,
}

/// A change of the floodlight's on/off state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEvent {
    pub on: bool,
    pub lux: f32,
    pub moving: bool,
    pub mode: ControlMode,
}
