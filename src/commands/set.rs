//! `set` command: update configuration fields in place.
//!
//! Only the assigned lines change; comments and alignment in the rest of the
//! file are left alone.

use anyhow::{Context, Result};
use std::fs;

use crate::config::builder::set_field_in_content;
use crate::config::loading::parse_config;
use crate::config::{Config, create_default_config, resolve_field};

/// Apply every `field=value` pair to the configuration file.
///
/// All values are checked before anything is written.
pub fn handle_set_command(fields: &[(String, String)]) -> Result<()> {
    log_version!();

    let config_path = Config::get_config_path()?;
    if !config_path.exists() {
        create_default_config(&config_path)?;
    }

    let mut validated = Vec::new();
    for (field, value) in fields {
        match validate_field_value(field, value) {
            Ok(entry) => validated.push(entry),
            Err(e) => {
                log_pipe!();
                log_error!("Invalid value for field '{field}': {e:#}");
                anyhow::bail!("Configuration validation failed");
            }
        }
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let (updated, changed) = apply_fields(&content, &validated)?;

    if changed.is_empty() {
        log_block_start!("Configuration unchanged");
        if let [(table, key, value)] = validated.as_slice() {
            log_indented!("{table}.{key} is already set to {value}");
        } else {
            log_indented!("All fields already have the specified values");
        }
    } else {
        fs::write(&config_path, &updated)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        log_block_start!("Updated configuration");
        for (table, key, value) in &changed {
            log_indented!("{table}.{key} = {value}");
        }
        log_indented!("in {}", config_path.display());
    }

    log_end!();
    Ok(())
}

/// A field resolved to its table, with the value as it will be written.
pub type FieldUpdate = (&'static str, &'static str, String);

/// Resolve `field` and check `value` against its type and range.
pub fn validate_field_value(field: &str, value: &str) -> Result<FieldUpdate> {
    let Some((table, key)) = resolve_field(field) else {
        anyhow::bail!("unknown field");
    };

    let value = match value.trim().to_lowercase().as_str() {
        "yes" | "on" => "true".to_string(),
        "no" | "off" => "false".to_string(),
        _ => value.trim().to_string(),
    };

    let snippet = format!("[{table}]\n{key} = {value}\n");
    parse_config(&snippet).with_context(|| format!("'{value}' is not valid for {table}.{key}"))?;

    Ok((table, key, value))
}

/// Write validated values into `content`.
///
/// Returns the new text and the updates that changed it. The result is parsed
/// as a whole before being returned.
pub fn apply_fields(content: &str, fields: &[FieldUpdate]) -> Result<(String, Vec<FieldUpdate>)> {
    let mut content = content.to_string();
    let mut changed = Vec::new();

    for (table, key, value) in fields {
        let updated = set_field_in_content(&content, table, key, value);
        if updated != content {
            content = updated;
            changed.push((*table, *key, value.clone()));
        }
    }

    parse_config(&content).context("Updated configuration would not load")?;
    Ok((content, changed))
}

/// Detailed help for `help set`.
pub fn display_help() {
    log_version!();
    log_block_start!("set - Update configuration fields");
    log_block_start!("Usage: mowlight set <field>=<value> [<field>=<value>...]");
    log_block_start!("Arguments:");
    log_indented!("<field>  Field name, as 'key' or 'table.key'");
    log_indented!("<value>  New value; booleans also accept yes/no and on/off");
    log_block_start!("Examples:");
    log_indented!("mowlight set shutoff_delay_ms=60000");
    log_indented!("mowlight set time_window_enabled=on time_window_start=21");
    log_indented!("mowlight set light.lux_threshold=4.5");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::default_config_content;

    #[test]
    fn test_validate_accepts_and_normalizes() {
        assert_eq!(
            validate_field_value("auto_mode", "off").unwrap(),
            ("decision", "auto_mode", "false".to_string())
        );
        assert_eq!(
            validate_field_value("light.brightness", " 90 ").unwrap(),
            ("light", "brightness", "90".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(validate_field_value("brightness", "300").is_err());
        assert!(validate_field_value("time_window_end", "24").is_err());
        assert!(validate_field_value("pulse_count", "0").is_err());
        assert!(validate_field_value("auto_mode", "maybe").is_err());
        assert!(validate_field_value("colour", "red").is_err());
    }

    #[test]
    fn test_apply_fields_reports_only_changes() {
        let content = default_config_content();
        let updates = vec![
            validate_field_value("auto_mode", "true").unwrap(),
            validate_field_value("shutoff_delay_ms", "5000").unwrap(),
        ];
        let (updated, changed) = apply_fields(&content, &updates).unwrap();

        assert_eq!(changed, vec![("decision", "shutoff_delay_ms", "5000".to_string())]);
        let config = parse_config(&updated).unwrap();
        assert_eq!(config.decision.shutoff_delay_ms, Some(5000));
        assert_eq!(updated.lines().count(), content.lines().count());
    }

    #[test]
    fn test_apply_fields_unchanged() {
        let content = "[light]\nbrightness = 40\n";
        let updates = vec![validate_field_value("brightness", "40").unwrap()];
        let (updated, changed) = apply_fields(content, &updates).unwrap();
        assert!(changed.is_empty());
        assert_eq!(updated, content);
    }
}
