//! `simulate` command: replay a scenario file.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::logger::Log;
use crate::simulate::{RunOptions, Scenario, SimulationReport, run_scenario};

/// Options for one `simulate` invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulateOptions {
    /// Sleep between polls so the run takes real time.
    pub paced: bool,
    /// Print the event log as JSON on stdout.
    pub json: bool,
    /// Send log output to this file instead of stdout.
    pub log_file: Option<String>,
    pub debug_enabled: bool,
}

/// Load `path`, replay it and print the outcome.
///
/// Ctrl-C or SIGTERM ends the replay early; the partial report is still shown.
pub fn handle_simulate_command(path: &Path, options: &SimulateOptions) -> Result<()> {
    let _log_guard = match &options.log_file {
        Some(file) => Some(
            Log::start_file_logging(file.clone())
                .with_context(|| format!("Failed to start logging to {file}"))?,
        ),
        None => None,
    };
    // JSON goes to stdout, so the timeline only appears when it has a file.
    if options.json && options.log_file.is_none() {
        Log::set_enabled(false);
    }

    log_version!();
    let scenario = Scenario::load(path)?;
    if options.debug_enabled {
        scenario.config.log_config(path);
    }

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;

    let report = run_scenario(
        &scenario,
        RunOptions {
            paced: options.paced,
        },
        &stop,
    )?;

    if options.json {
        println!("{}", report.events_json);
    } else {
        log_report(&report);
    }
    log_end!();

    Ok(())
}

fn log_report(report: &SimulationReport) {
    log_block_start!("Transitions:");
    if report.transitions.is_empty() {
        log_indented!("none");
    }
    for t in &report.transitions {
        log_indented!(
            "{:>9} ms  {} -> {}  (light {})",
            t.at_ms,
            t.from,
            t.to,
            if t.light_on { "on" } else { "off" }
        );
    }

    log_block_start!("Event log (newest first):");
    if report.events.is_empty() {
        log_indented!("empty");
    }
    for entry in &report.events {
        log_indented!(
            "{}  {:<3}  lux {:>6.1}  motion {:<5}  mode {}",
            entry.timestamp,
            if entry.on { "ON" } else { "OFF" },
            entry.lux,
            entry.moving,
            entry.mode
        );
    }

    log_block_start!(
        "Light {} at brightness {}, state {}",
        if report.light_on { "on" } else { "off" },
        report.brightness,
        report.final_state
    );
}

/// Detailed help for `help simulate`.
pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay a scripted mowing run");
    log_block_start!("Usage: mowlight simulate [OPTIONS] <scenario.toml>");
    log_block_start!("Options:");
    log_indented!("-p, --paced       Run in real time instead of fast-forwarding");
    log_indented!("-j, --json        Print the event log as JSON");
    log_indented!("-l, --log <file>  Write the timeline to <file>");
    log_block_start!("Scenario format:");
    log_indented!("[scenario]        name, start_hour, poll_interval_ms, epoch");
    log_indented!("[light] [motion] [decision]  same keys as mowlight.toml");
    log_indented!("[[segment]]       duration_ms, lux, accel, gyro, hour,");
    log_indented!("                  clock_lost, command = {{ action = ... }}");
    log_block_start!("Commands:");
    log_indented!("force_on (brightness), force_off, return_to_auto,");
    log_indented!("fade (target, duration_ms), auto_mode (enabled)");
    log_block_start!("Examples:");
    log_indented!("mowlight simulate demos/evening_mow.toml");
    log_indented!("mowlight simulate --json demos/clock_loss.toml");
    log_end!();
}
