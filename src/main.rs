//! mowlight binary: parse arguments and dispatch to a command.

use std::path::Path;

use mowlight::args::{CliAction, ParsedArgs};
use mowlight::commands;
use mowlight::commands::simulate::SimulateOptions;
use mowlight::constants::EXIT_FAILURE;
use mowlight::{log_end, log_error_exit, log_warning};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    if let Err(e) = run(parsed_args.action) {
        log_error_exit!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(action: CliAction) -> anyhow::Result<()> {
    match action {
        CliAction::ShowVersion => {
            println!("mowlight {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::ShowHelp => {
            commands::help::display_usage();
            Ok(())
        }
        CliAction::ShowHelpDueToError { message } => {
            log_warning!("{message}");
            commands::help::display_usage();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::ShowCommandUsage { command, message } => {
            log_warning!("{message}");
            commands::help::show_command_usage(&command);
            log_end!();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => {
            commands::help::run_help_command(command.as_deref())
        }
        CliAction::Get {
            fields,
            json,
            config_dir,
        } => {
            mowlight::config::set_config_dir(config_dir)?;
            commands::get::handle_get_command(&fields, json)
        }
        CliAction::Set { fields, config_dir } => {
            mowlight::config::set_config_dir(config_dir)?;
            commands::set::handle_set_command(&fields)
        }
        CliAction::Simulate {
            path,
            paced,
            json,
            log_file,
            debug_enabled,
        } => commands::simulate::handle_simulate_command(
            Path::new(&path),
            &SimulateOptions {
                paced,
                json,
                log_file,
                debug_enabled,
            },
        ),
    }
}
