use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use mowlight::logger::Log;
use mowlight::simulate::{RunOptions, Scenario, SimulationReport, run_scenario};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

fn replay(scenario: &Scenario) -> SimulationReport {
    Log::set_enabled(false);
    run_scenario(scenario, RunOptions::default(), &AtomicBool::new(false)).unwrap()
}

fn path_of(report: &SimulationReport) -> Vec<&'static str> {
    report.transitions.iter().map(|t| t.to).collect()
}

#[test]
fn test_evening_mow_demo() {
    let scenario = Scenario::load(&demo("evening_mow.toml")).unwrap();
    assert_eq!(scenario.name(), "evening mow");
    let report = replay(&scenario);

    assert_eq!(path_of(&report), ["ON", "COUNTDOWN", "OFF", "ON"]);
    assert!(!report.light_on);
    assert!(!report.interrupted);

    let modes: Vec<&str> = report.events.iter().map(|e| e.mode.as_str()).collect();
    assert_eq!(modes, ["off", "auto", "auto", "auto"]);
    let on_flags: Vec<bool> = report.events.iter().map(|e| e.on).collect();
    assert_eq!(on_flags, [false, true, false, true]);
    assert!(report.events.iter().all(|e| e.timestamp >= 1_750_000_000));
}

#[test]
fn test_clock_loss_demo_fails_open() {
    let scenario = Scenario::load(&demo("clock_loss.toml")).unwrap();
    let report = replay(&scenario);

    assert_eq!(path_of(&report), ["ON", "COUNTDOWN", "OFF"]);
    assert_eq!(report.final_state, "OFF");
    assert_eq!(report.events.len(), 2);

    // Light came on only after the clock dropped out, 3 s into the run.
    let boot_ms = report.elapsed_ms - 10_000;
    assert!(report.transitions[0].at_ms >= boot_ms + 3_000);
}

#[test]
fn test_json_export_shape() {
    let scenario = Scenario::load(&demo("evening_mow.toml")).unwrap();
    let report = replay(&scenario);

    let json: serde_json::Value = serde_json::from_str(&report.events_json).unwrap();
    assert_eq!(json["total"], 4);
    let logs = json["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 4);
    assert_eq!(logs[0]["event"], "off");
    assert_eq!(logs[0]["mode"], "off");
    assert_eq!(logs[1]["event"], "on");
    assert!(logs[1]["lux"].is_number());
}

#[test]
fn test_fade_and_return_to_auto() {
    let scenario = Scenario::parse(
        r#"
[scenario]
start_hour = 23
epoch = 0

[motion]
calibration_samples = 5

[[segment]]
duration_ms = 1000
lux = 500.0
command = { action = "fade", target = 128, duration_ms = 500 }

[[segment]]
duration_ms = 1000
lux = 500.0
command = { action = "return_to_auto" }
"#,
    )
    .unwrap();
    let report = replay(&scenario);

    assert!(!report.light_on);
    let modes: Vec<&str> = report.events.iter().map(|e| e.mode.as_str()).collect();
    assert_eq!(modes, ["auto", "manual"]);
}

#[test]
fn test_disabled_auto_mode_ignores_conditions() {
    let scenario = Scenario::parse(
        r#"
[motion]
calibration_samples = 5

[[segment]]
duration_ms = 2000
lux = 1.0
accel = [0.0, 0.5, 1.0]
command = { action = "auto_mode", enabled = false }
"#,
    )
    .unwrap();
    let report = replay(&scenario);
    assert!(report.transitions.is_empty());
    assert!(report.events.is_empty());
}

#[test]
fn test_auto_mode_off_in_decision_table_is_honoured() {
    let scenario = Scenario::parse(
        r#"
[scenario]
start_hour = 23

[motion]
calibration_samples = 5

[decision]
auto_mode = false
light_sensor_bypass = true
movement_bypass = true

[[segment]]
duration_ms = 2000
lux = 500.0
"#,
    )
    .unwrap();
    let report = replay(&scenario);
    assert!(report.transitions.is_empty());
    assert!(!report.light_on);
}

#[test]
fn test_missing_scenario_file_names_path() {
    let err = Scenario::load(&demo("no_such_file.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("no_such_file.toml"));
}
