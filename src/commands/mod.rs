//! Command-line subcommands.
//!
//! Each command lives in its own module with a `handle_*_command` entry point
//! and a `display_help` used by `mowlight help <command>`.

pub mod get;
pub mod help;
pub mod set;
pub mod simulate;
