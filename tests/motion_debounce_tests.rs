use std::cell::RefCell;
use std::rc::Rc;

use mowlight::io::ScriptedImu;
use mowlight::logger::Log;
use mowlight::motion::{Axes, MotionClassifier, MotionSample, MotionSettings};
use mowlight::time_source::{Clock, SimulatedClock};

struct Rig {
    clock: SimulatedClock,
    imu: Rc<RefCell<ScriptedImu>>,
    classifier: MotionClassifier,
}

fn bump() -> MotionSample {
    MotionSample::new(Axes::new(0.0, 0.4, 1.0), Axes::default())
}

// Calibrated classifier with the clock reset to zero.
fn calibrated(settings: MotionSettings) -> Rig {
    Log::set_enabled(false);
    let clock = SimulatedClock::new(0);
    let imu = Rc::new(RefCell::new(ScriptedImu::at_rest()));
    let mut classifier =
        MotionClassifier::new(Box::new(imu.clone()), Box::new(clock.clone()), settings);
    classifier.calibrate(10).unwrap();
    clock.set_millis(0);
    Rig {
        clock,
        imu,
        classifier,
    }
}

impl Rig {
    /// Read one sample at absolute time `at`.
    fn sample_at(&mut self, at: u32, sample: MotionSample) -> bool {
        self.clock.set_millis(at);
        self.imu.borrow_mut().set_hold(sample);
        self.classifier.detect_motion()
    }
}

#[test]
fn test_three_spaced_pulses_confirm_motion() {
    let mut rig = calibrated(MotionSettings::default());
    assert!(!rig.sample_at(0, bump()));
    assert!(!rig.sample_at(100, bump()));
    assert!(rig.sample_at(200, bump()));
}

#[test]
fn test_two_pulses_are_not_enough() {
    let mut rig = calibrated(MotionSettings::default());
    rig.sample_at(0, bump());
    rig.sample_at(100, bump());
    for t in (120..=500).step_by(20) {
        assert!(!rig.sample_at(t, MotionSample::at_rest()));
    }
}

#[test]
fn test_single_long_spike_counts_once() {
    let mut rig = calibrated(MotionSettings::default());
    // Samples closer than the anti-chatter gate do not add pulses.
    for t in (0..=40).step_by(10) {
        assert!(!rig.sample_at(t, bump()));
    }
    assert_eq!(rig.classifier.pulse_window().pulse_count(), 1);
}

#[test]
fn test_pulses_spanning_two_windows_restart_the_count() {
    let mut rig = calibrated(MotionSettings::default());
    rig.sample_at(0, bump());
    rig.sample_at(100, bump());
    // Third pulse lands after the window ran out.
    assert!(!rig.sample_at(600, bump()));
    assert_eq!(rig.classifier.pulse_window().pulse_count(), 1);
    assert_eq!(rig.classifier.pulse_window().window_start(), Some(600));
}

#[test]
fn test_stop_delay_boundary() {
    let mut rig = calibrated(MotionSettings::default());
    rig.sample_at(0, bump());
    rig.sample_at(100, bump());
    assert!(rig.sample_at(200, bump()));

    let stop_delay = rig.classifier.stop_delay_ms();
    assert!(rig.sample_at(200 + stop_delay - 1, MotionSample::at_rest()));
    assert!(rig.sample_at(200 + stop_delay, MotionSample::at_rest()));
    assert!(!rig.sample_at(200 + stop_delay + 1, MotionSample::at_rest()));
    assert_eq!(rig.classifier.pulse_window().window_start(), None);
}

#[test]
fn test_gyro_alone_triggers() {
    let mut rig = calibrated(MotionSettings::default());
    let turning = MotionSample::new(Axes::new(0.0, 0.0, 1.0), Axes::new(0.0, 0.0, 20.0));
    rig.sample_at(0, turning);
    rig.sample_at(60, turning);
    assert!(rig.sample_at(120, turning));
    assert!(rig.classifier.max_gyro_deviation() >= 20.0);
}

#[test]
fn test_uncalibrated_classifier_never_moves() {
    Log::set_enabled(false);
    let clock = SimulatedClock::new(0);
    let imu = Rc::new(RefCell::new(ScriptedImu::holding(bump())));
    let mut classifier = MotionClassifier::new(
        Box::new(imu.clone()),
        Box::new(clock.clone()),
        MotionSettings::default(),
    );
    for _ in 0..10 {
        clock.advance(100);
        assert!(!classifier.detect_motion());
    }
    assert_eq!(imu.borrow().reads(), 0);
}

#[test]
fn test_setters_apply_on_next_sample() {
    let mut rig = calibrated(MotionSettings::default());
    rig.classifier.set_pulse_count(1);
    assert!(rig.sample_at(0, bump()));

    // A threshold above the deviation makes the same sample quiet.
    rig.classifier.set_accel_threshold(1.0);
    let later = 1 + rig.classifier.stop_delay_ms() + 1;
    assert!(!rig.sample_at(later, bump()));
}

#[test]
fn test_motion_survives_clock_wrap() {
    let mut rig = calibrated(MotionSettings::default());
    let start = u32::MAX - 150;
    rig.sample_at(start, bump());
    rig.sample_at(start.wrapping_add(100), bump());
    assert!(rig.sample_at(start.wrapping_add(200), bump()));
    assert!(rig.clock.now_millis() < start);
}

#[test]
fn test_recalibration_clears_partial_window() {
    let mut rig = calibrated(MotionSettings::default());
    rig.sample_at(0, bump());
    rig.sample_at(100, bump());
    rig.imu.borrow_mut().set_hold(MotionSample::at_rest());
    rig.classifier.calibrate(5).unwrap();
    assert_eq!(rig.classifier.pulse_window().pulse_count(), 0);
    assert_eq!(rig.classifier.max_accel_deviation(), 0.0);
}
