//! # mowlight
//!
//! Floodlight controller for a lawn-mowing robot. The light comes on when it is
//! dark and the mower is moving, stays on for a shutoff delay once either
//! condition ends, and can be forced on or off by hand.
//!
//! ## Architecture
//!
//! - **Motion**: `motion` turns raw IMU samples into a debounced moving/still
//!   signal against a calibrated rest baseline.
//! - **Decision**: `decision` holds the OFF/ON/COUNTDOWN state machine, the
//!   time window, manual overrides and the `Controller` polling loop.
//! - **Collaborators**: `io` defines the hardware-facing traits and in-memory
//!   implementations (lamp, light sensor state, event log, scripted IMU).
//! - **Configuration**: `config` reads and edits `mowlight.toml`.
//! - **Simulation**: `simulate` replays scenario files on a simulated clock.
//! - **Infrastructure**: `time_source`, `logger`, `args` and `commands`.

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod decision;
pub mod io;
pub mod motion;
pub mod simulate;
pub mod time_source;

pub use config::Config;
pub use decision::{Controller, DecisionConfig, DecisionEngine, DecisionState};
pub use motion::{MotionClassifier, MotionSample, MotionSettings};
pub use time_source::{Clock, SimulatedClock, SystemClock};
