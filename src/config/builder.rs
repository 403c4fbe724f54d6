//! Default configuration generation and in-place field editing.
//!
//! Edits work on the file text rather than re-serializing it, so user
//! comments and alignment survive `set` commands and store saves.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Write a commented default configuration to `path`.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))?;

    log_block_start!("Created default configuration: {}", path.display());
    Ok(())
}

/// Text of the default configuration file.
pub fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_table("light", "Ambient light")
        .add_setting(
            "lux_threshold",
            &format!("{DEFAULT_LUX_THRESHOLD:.1}"),
            "Below this lux level it is night",
        )
        .add_setting(
            "brightness",
            &DEFAULT_BRIGHTNESS.to_string(),
            "Floodlight brightness when switching on (0-255)",
        )
        .add_table("motion", "Motion detection")
        .add_setting(
            "accel_threshold",
            &format!("{DEFAULT_ACCEL_THRESHOLD:.2}"),
            "Accelerometer deviation threshold (g)",
        )
        .add_setting(
            "gyro_threshold",
            &format!("{DEFAULT_GYRO_THRESHOLD:.1}"),
            "Gyroscope deviation threshold (deg/s)",
        )
        .add_setting(
            "window_ms",
            &DEFAULT_MOTION_WINDOW_MS.to_string(),
            "Pulse window length in milliseconds",
        )
        .add_setting(
            "pulse_count",
            &DEFAULT_MOTION_PULSE_COUNT.to_string(),
            "Pulses within one window to count as moving",
        )
        .add_setting(
            "stop_delay_ms",
            &DEFAULT_MOTION_STOP_DELAY_MS.to_string(),
            "Quiet time before motion is over",
        )
        .add_setting(
            "calibration_samples",
            &DEFAULT_CALIBRATION_SAMPLES.to_string(),
            "Samples averaged for the rest baseline",
        )
        .add_table("decision", "Decision engine")
        .add_setting(
            "shutoff_delay_ms",
            &DEFAULT_SHUTOFF_DELAY_MS.to_string(),
            "Light stays on this long after conditions end",
        )
        .add_setting("auto_mode", "true", "Automatic control enabled")
        .add_setting("light_sensor_bypass", "false", "Treat it as always night")
        .add_setting("movement_bypass", "false", "Treat the mower as always moving")
        .add_setting(
            "time_window_enabled",
            "false",
            "Restrict activation to the hours below",
        )
        .add_setting(
            "time_window_invert",
            "false",
            "Operate outside the hours instead",
        )
        .add_setting(
            "time_window_start",
            &DEFAULT_TIME_WINDOW_START.to_string(),
            "First hour of the window (0-23)",
        )
        .add_setting(
            "time_window_end",
            &DEFAULT_TIME_WINDOW_END.to_string(),
            "Hour the window ends (0-23, may wrap past midnight)",
        )
        .build()
}

/// Builder for configuration files with aligned trailing comments.
struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Table { name: String, title: String },
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_table(mut self, name: &str, title: &str) -> Self {
        self.entries.push(Entry::Table {
            name: name.to_string(),
            title: title.to_string(),
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                Entry::Table { .. } => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                Entry::Table { name, title } => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(format!("# {title}"));
                    result.push(format!("[{name}]"));
                }
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        let mut text = result.join("\n");
        text.push('\n');
        text
    }
}

/// Table name if `line` is a `[table]` header.
fn table_header(line: &str) -> Option<&str> {
    let code = line.split('#').next().unwrap_or("").trim();
    code.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

/// Whether `line` assigns `key`.
fn assigns_key(line: &str, key: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.starts_with('#')
        && trimmed
            .split_once('=')
            .is_some_and(|(lhs, _)| lhs.trim() == key)
}

/// Index of the line assigning `key` inside `[table]`.
pub(crate) fn find_field_line(content: &str, table: &str, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    for (index, line) in content.lines().enumerate() {
        if let Some(name) = table_header(line) {
            current = Some(name);
        } else if current == Some(table) && assigns_key(line, key) {
            return Some(index);
        }
    }
    None
}

/// Replace the value on `original_line`, keeping its trailing comment and spacing.
pub(crate) fn preserve_comment_formatting(original_line: &str, key: &str, new_value: &str) -> String {
    let indent_len = original_line.len() - original_line.trim_start().len();
    let indent = &original_line[..indent_len];
    let key_value_part = format!("{indent}{key} = {new_value}");

    let Some(comment_pos) = original_line.find('#') else {
        return key_value_part;
    };
    let comment_part = &original_line[comment_pos..];
    let before_comment = &original_line[..comment_pos];
    let original_spacing = before_comment
        .rfind(|c: char| !c.is_whitespace())
        .map_or(" ", |last| &before_comment[last + 1..]);
    let spacing = if original_spacing.is_empty() {
        " "
    } else {
        original_spacing
    };

    format!("{key_value_part}{spacing}{comment_part}")
}

/// Set `table.key = value` in configuration text.
///
/// Replaces an existing assignment in place, otherwise appends the key to the
/// end of the table, creating the table if needed.
pub(crate) fn set_field_in_content(content: &str, table: &str, key: &str, value: &str) -> String {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    if let Some(index) = find_field_line(content, table, key) {
        lines[index] = preserve_comment_formatting(&lines[index], key, value);
    } else if let Some(header) = lines
        .iter()
        .position(|line| table_header(line) == Some(table))
    {
        // Last non-blank line of the table body.
        let next_header = lines[header + 1..]
            .iter()
            .position(|line| table_header(line).is_some())
            .map_or(lines.len(), |offset| header + 1 + offset);
        let mut insert_at = next_header;
        while insert_at > header + 1 && lines[insert_at - 1].trim().is_empty() {
            insert_at -= 1;
        }
        // A comment directly above the next header belongs to that table.
        if next_header < lines.len() {
            while insert_at > header + 1 && lines[insert_at - 1].trim_start().starts_with('#') {
                insert_at -= 1;
            }
            while insert_at > header + 1 && lines[insert_at - 1].trim().is_empty() {
                insert_at -= 1;
            }
        }
        lines.insert(insert_at, format!("{key} = {value}"));
    } else {
        if lines.last().is_some_and(|line| !line.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push(format!("[{table}]"));
        lines.push(format!("{key} = {value}"));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
