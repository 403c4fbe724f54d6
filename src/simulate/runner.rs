//! Replays a [`Scenario`] on simulated time.

use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{OverrideCommand, Scenario, Segment};
use crate::decision::{Controller, DecisionEngine};
use crate::io::{
    Actuator, EventLog, Lamp, LogEntry, LuxThreshold, MemoryConfigStore, ScriptedImu,
};
use crate::logger::Log;
use crate::motion::{MotionClassifier, MotionSample};
use crate::time_source::{Clock, SimulatedClock};

/// How to replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Sleep in real time between polls instead of fast-forwarding.
    pub paced: bool,
}

/// A decision-state change seen during the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Simulated milliseconds since boot.
    pub at_ms: u32,
    pub from: &'static str,
    pub to: &'static str,
    pub light_on: bool,
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub transitions: Vec<Transition>,
    /// Event log contents, newest first.
    pub events: Vec<LogEntry>,
    pub events_json: String,
    pub final_state: &'static str,
    pub light_on: bool,
    pub brightness: u8,
    pub polls: u64,
    /// Simulated time from boot to the end of the run.
    pub elapsed_ms: u32,
    /// Stopped early by `stop`.
    pub interrupted: bool,
}

struct Rig {
    clock: SimulatedClock,
    imu: Rc<RefCell<ScriptedImu>>,
    lux: Rc<RefCell<LuxThreshold>>,
    lamp: Rc<RefCell<Lamp>>,
    events: Rc<RefCell<EventLog>>,
    controller: Controller,
}

fn build_rig(scenario: &Scenario) -> Rig {
    let clock = match scenario.scenario.start_hour {
        Some(hour) => SimulatedClock::with_hour(0, hour),
        None => SimulatedClock::new(0),
    };
    let epoch = scenario
        .scenario
        .epoch
        .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);

    let imu = Rc::new(RefCell::new(ScriptedImu::at_rest()));
    let lux = Rc::new(RefCell::new(LuxThreshold::new(
        scenario.config.lux_threshold(),
    )));
    let lamp = Rc::new(RefCell::new(Lamp::new().with_clock(Box::new(clock.clone()))));
    let events = Rc::new(RefCell::new(EventLog::new(Box::new(clock.clone()), epoch)));
    let store = MemoryConfigStore::new(
        scenario.config.decision_config(),
        scenario.config.brightness(),
    );

    let classifier = MotionClassifier::new(
        Box::new(imu.clone()),
        Box::new(clock.clone()),
        scenario.config.motion_settings(),
    );
    let engine = DecisionEngine::new(
        Box::new(clock.clone()),
        Box::new(lamp.clone()),
        Box::new(store),
        Box::new(events.clone()),
    );
    let controller = Controller::new(classifier, Box::new(lux.clone()), engine);

    Rig {
        clock,
        imu,
        lux,
        lamp,
        events,
        controller,
    }
}

impl Rig {
    fn enter_segment(&mut self, index: usize, segment: &Segment) {
        log_block_start!(
            "Segment {} ({} ms)",
            index + 1,
            segment.duration_ms
        );

        if segment.clock_lost {
            self.clock.clear_wall_clock();
        }
        if let Some(hour) = segment.hour {
            self.clock.set_hour(hour);
        }

        self.lux.borrow_mut().update(segment.lux);
        self.imu.borrow_mut().set_hold(segment.sample());

        if let Some(command) = segment.command {
            let engine = self.controller.engine_mut();
            match command {
                OverrideCommand::ForceOn { brightness } => engine.force_on(brightness),
                OverrideCommand::ForceOff => engine.force_off(),
                OverrideCommand::ReturnToAuto => engine.return_to_auto(),
                OverrideCommand::Fade {
                    target,
                    duration_ms,
                } => engine.manual_fade(target, duration_ms),
                OverrideCommand::AutoMode { enabled } => engine.set_auto_mode(enabled),
            }
            Log::update_sim_clock(self.clock.now_millis());
        }
    }
}

/// Replay `scenario` until its segments are exhausted or `stop` is raised.
pub fn run_scenario(
    scenario: &Scenario,
    options: RunOptions,
    stop: &AtomicBool,
) -> Result<SimulationReport> {
    let mut rig = build_rig(scenario);
    let poll_interval = scenario.poll_interval_ms();

    Log::set_sim_clock(rig.clock.now_millis());
    log_block_start!("Replaying {}", scenario.name());
    log_indented!(
        "{} segments, {} ms simulated, polling every {poll_interval} ms",
        scenario.segment.len(),
        scenario.total_duration_ms()
    );

    // Calibration happens on a still mower regardless of the first segment.
    rig.imu.borrow_mut().set_hold(MotionSample::at_rest());
    rig.controller.boot(scenario.config.calibration_samples())?;
    Log::update_sim_clock(rig.clock.now_millis());

    let mut transitions = Vec::new();
    let mut polls = 0u64;
    let mut interrupted = false;

    'segments: for (index, segment) in scenario.segment.iter().enumerate() {
        rig.enter_segment(index, segment);

        let mut spent = 0u32;
        while spent < segment.duration_ms {
            if stop.load(Ordering::SeqCst) {
                interrupted = true;
                break 'segments;
            }

            let before = rig.controller.engine().state_name();
            rig.controller.poll();
            polls += 1;
            let after = rig.controller.engine().state_name();
            if before != after {
                transitions.push(Transition {
                    at_ms: rig.clock.now_millis(),
                    from: before,
                    to: after,
                    light_on: rig.lamp.borrow().is_on(),
                });
            }

            let step = poll_interval.min(segment.duration_ms - spent);
            rig.clock.advance(step);
            spent += step;
            Log::update_sim_clock(rig.clock.now_millis());

            if options.paced {
                std::thread::sleep(Duration::from_millis(u64::from(step)));
            }
        }
    }

    if interrupted {
        log_pipe!();
        log_warning!("Simulation interrupted");
    }

    let engine = rig.controller.engine();
    let events = rig.events.borrow();
    let report = SimulationReport {
        transitions,
        events: events.iter().cloned().collect(),
        events_json: events.to_json()?,
        final_state: engine.state_name(),
        light_on: rig.lamp.borrow().is_on(),
        brightness: rig.lamp.borrow().brightness(),
        polls,
        elapsed_ms: rig.clock.now_millis(),
        interrupted,
    };

    log_block_start!(
        "Finished in state {} after {} polls",
        report.final_state,
        report.polls
    );
    log_indented!("{} light events logged", report.events.len());
    Log::clear_sim_clock();

    Ok(report)
}
