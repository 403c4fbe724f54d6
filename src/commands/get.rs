//! `get` command: print configuration values.
//!
//! Output is meant for scripts: a single field prints only its value, several
//! fields print `table.key=value` lines, and `--json` prints one object.

use anyhow::Result;
use serde_json::json;

use crate::config::{Config, FIELDS, resolve_field};
use crate::logger::Log;

/// Print the requested fields of the active configuration.
///
/// `all` selects every field.
pub fn handle_get_command(fields: &[String], json: bool) -> Result<()> {
    // Keep stdout parseable when the default file gets created.
    let was_enabled = Log::is_enabled();
    Log::set_enabled(false);
    let loaded = Config::load();
    Log::set_enabled(was_enabled);
    let config = loaded?;

    let values = match collect_fields(&config, fields) {
        Ok(values) => values,
        Err(unknown) => {
            if json {
                let error = json!({
                    "error": format!("Unknown field: {}", unknown.join(", ")),
                    "type": "UnknownField",
                    "available": all_field_names(),
                });
                eprintln!("{}", serde_json::to_string(&error)?);
            } else {
                log_pipe!();
                log_error!("Unknown configuration field: {}", unknown.join(", "));
                log_block_start!("Available fields:");
                for name in all_field_names() {
                    log_indented!("{name}");
                }
                log_end!();
            }
            anyhow::bail!("Unknown configuration field");
        }
    };

    if json {
        let mut object = serde_json::Map::new();
        for (name, value) in values {
            object.insert(name, json!(value));
        }
        println!("{}", serde_json::to_string(&object)?);
    } else if values.len() == 1 && fields.len() == 1 && fields[0] != "all" {
        println!("{}", values[0].1);
    } else {
        for (name, value) in values {
            println!("{name}={value}");
        }
    }

    Ok(())
}

/// Resolve `fields` to `(table.key, value)` pairs, or the names that don't exist.
pub fn collect_fields(
    config: &Config,
    fields: &[String],
) -> std::result::Result<Vec<(String, String)>, Vec<String>> {
    let requested: Vec<String> = if fields.iter().any(|f| f == "all") {
        all_field_names()
    } else {
        fields.to_vec()
    };

    let mut values = Vec::new();
    let mut unknown = Vec::new();
    for name in &requested {
        match resolve_field(name) {
            Some((table, key)) => {
                let value = config.field_value(table, key).unwrap_or_default();
                values.push((format!("{table}.{key}"), value));
            }
            None => unknown.push(name.clone()),
        }
    }

    if unknown.is_empty() {
        Ok(values)
    } else {
        Err(unknown)
    }
}

fn all_field_names() -> Vec<String> {
    FIELDS
        .iter()
        .map(|(table, key)| format!("{table}.{key}"))
        .collect()
}

/// Detailed help for `help get`.
pub fn display_help() {
    log_version!();
    log_block_start!("get - Read configuration fields");
    log_block_start!("Usage: mowlight get [OPTIONS] <field> [<field>...]");
    log_block_start!("Options:");
    log_indented!("-j, --json  Output one JSON object");
    log_block_start!("Arguments:");
    log_indented!("<field>     Field name, as 'key' or 'table.key'");
    log_indented!("            Use 'all' to print every field");
    log_block_start!("Examples:");
    log_indented!("mowlight get shutoff_delay_ms");
    log_indented!("mowlight get light.brightness decision.auto_mode");
    log_indented!("mowlight get --json all");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        crate::config::loading::parse_config("[light]\nbrightness = 120\n").unwrap()
    }

    #[test]
    fn test_collect_single_field() {
        let values = collect_fields(&config(), &["brightness".to_string()]).unwrap();
        assert_eq!(values, vec![("light.brightness".to_string(), "120".to_string())]);
    }

    #[test]
    fn test_unset_field_prints_empty() {
        // parse_config leaves defaults unapplied.
        let values = collect_fields(&config(), &["pulse_count".to_string()]).unwrap();
        assert_eq!(values[0].1, "");
    }

    #[test]
    fn test_all_lists_every_field() {
        let values = collect_fields(&config(), &["all".to_string()]).unwrap();
        assert_eq!(values.len(), FIELDS.len());
    }

    #[test]
    fn test_unknown_fields_reported() {
        let fields = vec!["brightness".to_string(), "colour".to_string()];
        let unknown = collect_fields(&config(), &fields).unwrap_err();
        assert_eq!(unknown, vec!["colour".to_string()]);
    }
}
