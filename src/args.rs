//! Command-line argument parsing.
//!
//! Global flags (`--config`, `--debug`, `--help`, `--version`) may appear
//! anywhere; the first bare word is the subcommand and everything after it
//! belongs to that command.

/// What the binary should do.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Print configuration fields.
    Get {
        fields: Vec<String>,
        json: bool,
        config_dir: Option<String>,
    },
    /// Update configuration fields.
    Set {
        fields: Vec<(String, String)>,
        config_dir: Option<String>,
    },
    /// Replay a scenario file.
    Simulate {
        path: String,
        paced: bool,
        json: bool,
        log_file: Option<String>,
        debug_enabled: bool,
    },
    /// `help [COMMAND]`.
    HelpCommand { command: Option<String> },
    /// `--help` with no command.
    ShowHelp,
    ShowVersion,
    /// Bad arguments for `command`; print its usage and fail.
    ShowCommandUsage { command: String, message: String },
    /// Unknown option or command.
    ShowHelpDueToError { message: String },
}

/// Result of parsing command-line arguments.
#[derive(Debug)]
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }

    /// Parse `args`, whose first item is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        ParsedArgs {
            action: parse_action(&args),
        }
    }
}

fn parse_action(args: &[String]) -> CliAction {
    let mut debug_enabled = false;
    let mut config_dir = None;
    let mut help = false;
    let mut version = false;
    let mut command: Option<(String, &[String])> = None;

    let mut idx = 0;
    while idx < args.len() {
        let arg = args[idx].as_str();
        match arg {
            "--debug" | "-d" => debug_enabled = true,
            "--help" | "-h" => help = true,
            "--version" | "-V" | "-v" => version = true,
            "--config" | "-c" => {
                let Some(dir) = args.get(idx + 1) else {
                    return CliAction::ShowHelpDueToError {
                        message: "--config requires a directory".to_string(),
                    };
                };
                config_dir = Some(dir.clone());
                idx += 1;
            }
            _ if arg.starts_with('-') => {
                return CliAction::ShowHelpDueToError {
                    message: format!("Unknown option: {arg}"),
                };
            }
            _ => {
                command = Some((arg.to_string(), &args[idx + 1..]));
                break;
            }
        }
        idx += 1;
    }

    if version {
        return CliAction::ShowVersion;
    }

    let Some((name, rest)) = command else {
        return CliAction::ShowHelp;
    };
    if help {
        return CliAction::HelpCommand {
            command: Some(name),
        };
    }

    match name.as_str() {
        "get" | "g" => parse_get(rest, config_dir),
        "set" | "s" => parse_set(rest, config_dir),
        "simulate" | "S" => parse_simulate(rest, debug_enabled),
        "help" | "h" => CliAction::HelpCommand {
            command: rest.first().cloned(),
        },
        _ => CliAction::ShowHelpDueToError {
            message: format!("Unknown command: {name}"),
        },
    }
}

fn usage_error(command: &str, message: impl Into<String>) -> CliAction {
    CliAction::ShowCommandUsage {
        command: command.to_string(),
        message: message.into(),
    }
}

fn parse_get(rest: &[String], config_dir: Option<String>) -> CliAction {
    let mut json = false;
    let mut fields = Vec::new();
    for arg in rest {
        match arg.as_str() {
            "--json" | "-j" => json = true,
            "--help" | "-h" => {
                return CliAction::HelpCommand {
                    command: Some("get".to_string()),
                };
            }
            _ if arg.starts_with('-') => {
                return usage_error("get", format!("Unknown option: {arg}"));
            }
            _ => fields.push(arg.clone()),
        }
    }

    if fields.is_empty() {
        return usage_error("get", "No fields given");
    }
    CliAction::Get {
        fields,
        json,
        config_dir,
    }
}

fn parse_set(rest: &[String], config_dir: Option<String>) -> CliAction {
    let mut fields = Vec::new();
    for arg in rest {
        if arg == "--help" || arg == "-h" {
            return CliAction::HelpCommand {
                command: Some("set".to_string()),
            };
        }
        match arg.split_once('=') {
            Some((field, value)) if !field.is_empty() && !value.is_empty() => {
                fields.push((field.to_string(), value.to_string()));
            }
            _ => return usage_error("set", format!("Expected <field>=<value>, got '{arg}'")),
        }
    }

    if fields.is_empty() {
        return usage_error("set", "No fields given");
    }
    CliAction::Set { fields, config_dir }
}

fn parse_simulate(rest: &[String], debug_enabled: bool) -> CliAction {
    let mut paced = false;
    let mut json = false;
    let mut log_file = None;
    let mut path = None;

    let mut idx = 0;
    while idx < rest.len() {
        let arg = rest[idx].as_str();
        match arg {
            "--paced" | "-p" => paced = true,
            "--json" | "-j" => json = true,
            "--log" | "-l" => {
                let Some(file) = rest.get(idx + 1) else {
                    return usage_error("simulate", "--log requires a file");
                };
                log_file = Some(file.clone());
                idx += 1;
            }
            "--help" | "-h" => {
                return CliAction::HelpCommand {
                    command: Some("simulate".to_string()),
                };
            }
            _ if arg.starts_with('-') => {
                return usage_error("simulate", format!("Unknown option: {arg}"));
            }
            _ if path.is_some() => {
                return usage_error("simulate", "Only one scenario file may be given");
            }
            _ => path = Some(arg.to_string()),
        }
        idx += 1;
    }

    match path {
        Some(path) => CliAction::Simulate {
            path,
            paced,
            json,
            log_file,
            debug_enabled,
        },
        None => usage_error("simulate", "No scenario file given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["mowlight"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_no_arguments_shows_help() {
        assert_eq!(parse(&[]), CliAction::ShowHelp);
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["--debug"]), CliAction::ShowHelp);
    }

    #[test]
    fn test_version_wins() {
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        assert_eq!(parse(&["--version", "get", "all"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_get_with_config_dir() {
        assert_eq!(
            parse(&["--config", "/tmp/x", "get", "-j", "brightness", "auto_mode"]),
            CliAction::Get {
                fields: vec!["brightness".to_string(), "auto_mode".to_string()],
                json: true,
                config_dir: Some("/tmp/x".to_string()),
            }
        );
    }

    #[test]
    fn test_get_requires_fields() {
        assert!(matches!(
            parse(&["get"]),
            CliAction::ShowCommandUsage { command, .. } if command == "get"
        ));
    }

    #[test]
    fn test_set_pairs() {
        assert_eq!(
            parse(&["s", "brightness=40", "decision.auto_mode=false"]),
            CliAction::Set {
                fields: vec![
                    ("brightness".to_string(), "40".to_string()),
                    ("decision.auto_mode".to_string(), "false".to_string()),
                ],
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_set_rejects_missing_value() {
        assert!(matches!(
            parse(&["set", "brightness"]),
            CliAction::ShowCommandUsage { .. }
        ));
        assert!(matches!(
            parse(&["set", "brightness="]),
            CliAction::ShowCommandUsage { .. }
        ));
    }

    #[test]
    fn test_simulate_options() {
        assert_eq!(
            parse(&["-d", "simulate", "--paced", "--log", "run.log", "night.toml"]),
            CliAction::Simulate {
                path: "night.toml".to_string(),
                paced: true,
                json: false,
                log_file: Some("run.log".to_string()),
                debug_enabled: true,
            }
        );
    }

    #[test]
    fn test_simulate_errors() {
        assert!(matches!(parse(&["simulate"]), CliAction::ShowCommandUsage { .. }));
        assert!(matches!(
            parse(&["simulate", "a.toml", "b.toml"]),
            CliAction::ShowCommandUsage { .. }
        ));
        assert!(matches!(
            parse(&["simulate", "--log"]),
            CliAction::ShowCommandUsage { .. }
        ));
    }

    #[test]
    fn test_help_forms() {
        assert_eq!(
            parse(&["help", "set"]),
            CliAction::HelpCommand {
                command: Some("set".to_string())
            }
        );
        assert_eq!(parse(&["help"]), CliAction::HelpCommand { command: None });
        assert_eq!(
            parse(&["get", "--help"]),
            CliAction::HelpCommand {
                command: Some("get".to_string())
            }
        );
        assert_eq!(
            parse(&["--help", "simulate"]),
            CliAction::HelpCommand {
                command: Some("simulate".to_string())
            }
        );
    }

    #[test]
    fn test_unknown_input() {
        assert!(matches!(parse(&["--nope"]), CliAction::ShowHelpDueToError { .. }));
        assert!(matches!(parse(&["mow"]), CliAction::ShowHelpDueToError { .. }));
        assert!(matches!(parse(&["-c"]), CliAction::ShowHelpDueToError { .. }));
    }
}
