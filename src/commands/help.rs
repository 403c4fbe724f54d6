//! `help` command: general and per-command help.

use anyhow::Result;

/// One-line usage for a command, shown after argument errors.
pub fn show_command_usage(command: &str) {
    match command {
        "get" | "g" => log_block_start!("Usage: mowlight get [--json] <field> [<field>...]"),
        "set" | "s" => log_block_start!("Usage: mowlight set <field>=<value> [<field>=<value>...]"),
        "simulate" | "S" => log_block_start!(
            "Usage: mowlight simulate [--paced] [--json] [--log <file>] <scenario.toml>"
        ),
        _ => log_block_start!("Usage: mowlight [OPTIONS] [COMMAND]"),
    }
}

/// Dispatch `help [COMMAND]`.
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("get") | Some("g") => super::get::display_help(),
        Some("set") | Some("s") => super::set::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_version!();
            log_warning!("Unknown command: {unknown}");
            display_command_list();
            log_end!();
        }
    }
    Ok(())
}

/// Usage and options, for `--help` and unknown arguments.
pub fn display_usage() {
    log_version!();
    log_block_start!("Usage: mowlight [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>  Use <dir> instead of ~/.config/mowlight");
    log_indented!("-d, --debug         Print extra diagnostics");
    log_indented!("-h, --help          Show this help");
    log_indented!("-V, --version       Show the version");
    display_command_list();
    log_end!();
}

fn display_general_help() {
    log_version!();
    display_command_list();
    log_pipe!();
    log_info!("Use 'mowlight help <command>' for details on a command.");
    log_end!();
}

fn display_command_list() {
    log_block_start!("Commands:");
    log_indented!("get, g <field>             Read configuration field(s)");
    log_indented!("set, s <field>=<value>     Update configuration field(s)");
    log_indented!("simulate, S <scenario>     Replay a scripted mowing run");
    log_indented!("help, h [COMMAND]          Show help for a command");
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: mowlight help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Command to describe; general help if omitted");
    log_block_start!("Examples:");
    log_indented!("mowlight help");
    log_indented!("mowlight help simulate");
    log_end!();
}
