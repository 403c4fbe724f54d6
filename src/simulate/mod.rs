//! Scripted scenario replay.
//!
//! A scenario file describes a run of the floodlight as a list of timed
//! segments: what the IMU reports, what the light sensor reads, what the wall
//! clock says and which manual command (if any) is issued. The runner replays
//! it against a [`SimulatedClock`](crate::time_source::SimulatedClock) so a
//! night of mowing takes milliseconds.
//!
//! ```toml
//! [scenario]
//! name = "evening mow"
//! start_hour = 21
//! poll_interval_ms = 20
//!
//! [decision]
//! shutoff_delay_ms = 5000
//!
//! [[segment]]
//! duration_ms = 2000
//! lux = 3.0
//!
//! [[segment]]
//! duration_ms = 4000
//! accel = [0.0, 0.4, 1.0]
//!
//! [[segment]]
//! duration_ms = 1000
//! command = { action = "force_off" }
//! ```
//!
//! The `[light]`, `[motion]` and `[decision]` tables take the same keys as
//! `mowlight.toml`; anything left out uses the built-in defaults, so a scenario
//! replays the same way on every machine.

pub mod runner;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::config::validation::validate_config;
use crate::constants::DEFAULT_POLL_INTERVAL_MS;
use crate::motion::{Axes, MotionSample};

pub use runner::{RunOptions, SimulationReport, Transition, run_scenario};

/// `[scenario]` header.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioHeader {
    pub name: Option<String>,
    /// Wall-clock hour at boot; without it the clock starts unavailable.
    pub start_hour: Option<u8>,
    pub poll_interval_ms: Option<u32>,
    /// Unix time of boot, for event timestamps.
    pub epoch: Option<u64>,
}

/// Manual command issued at the start of a segment.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OverrideCommand {
    ForceOn { brightness: u8 },
    ForceOff,
    ReturnToAuto,
    Fade { target: u8, duration_ms: u32 },
    AutoMode { enabled: bool },
}

/// One stretch of constant conditions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Segment {
    pub duration_ms: u32,
    /// Light sensor reading; omitted means the read failed.
    #[serde(default)]
    pub lux: Option<f32>,
    #[serde(default = "rest_accel")]
    pub accel: [f32; 3],
    #[serde(default)]
    pub gyro: [f32; 3],
    /// Set the wall clock to this hour when the segment starts.
    #[serde(default)]
    pub hour: Option<u8>,
    /// Drop wall-clock time for the rest of the run, until an `hour` is given.
    #[serde(default)]
    pub clock_lost: bool,
    #[serde(default)]
    pub command: Option<OverrideCommand>,
}

fn rest_accel() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

impl Segment {
    pub fn sample(&self) -> MotionSample {
        let [ax, ay, az] = self.accel;
        let [gx, gy, gz] = self.gyro;
        MotionSample::new(Axes::new(ax, ay, az), Axes::new(gx, gy, gz))
    }
}

/// A parsed scenario file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Scenario {
    #[serde(default)]
    pub scenario: ScenarioHeader,
    #[serde(flatten)]
    pub config: Config,
    #[serde(default)]
    pub segment: Vec<Segment>,
}

impl Scenario {
    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        validate_config(&scenario.config)?;

        if scenario.segment.is_empty() {
            anyhow::bail!("Scenario has no [[segment]] entries");
        }
        if scenario.poll_interval_ms() == 0 {
            anyhow::bail!("poll_interval_ms must be at least 1");
        }
        let hours = scenario
            .scenario
            .start_hour
            .into_iter()
            .chain(scenario.segment.iter().filter_map(|s| s.hour));
        for hour in hours {
            if hour > 23 {
                anyhow::bail!("Scenario hour {hour} is not between 0 and 23");
            }
        }

        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario from {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse scenario from {}", path.display()))
    }

    pub fn name(&self) -> &str {
        self.scenario.name.as_deref().unwrap_or("unnamed scenario")
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.scenario
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    /// Simulated time covered by all segments.
    pub fn total_duration_ms(&self) -> u64 {
        self.segment.iter().map(|s| u64::from(s.duration_ms)).sum()
    }
}
