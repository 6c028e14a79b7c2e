//! Command-line interface for drivelog.
//!
//! This module provides the CLI structure for the `drivelog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, ExportFormatArg, LocateCommand, ProviderArg, SessionCommand};

/// drivelog - Log driving incidents by hand
///
/// Start a trip, press a button for each hard braking, sharp turn or phone
/// use, and export the log as JSON. Each event is tagged with the current
/// position when one can be obtained.
#[derive(Debug, Parser)]
#[command(name = "drivelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive logging session
    Session(SessionCommand),

    /// List the incident kinds and their buttons
    Kinds,

    /// Query the location provider once and print the result
    Locate(LocateCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use crate::logging::Verbosity;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "drivelog");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_from_cli() {
        let cli = Cli::try_parse_from(["drivelog", "-vv", "kinds"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Trace);

        let cli = Cli::try_parse_from(["drivelog", "-q", "kinds"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_session() {
        let cli = Cli::try_parse_from(["drivelog", "session"]).unwrap();
        match cli.command {
            Command::Session(cmd) => {
                assert!(cmd.output_dir.is_none());
                assert!(cmd.format.is_none());
                assert!(cmd.provider.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_session_overrides() {
        let cli = Cli::try_parse_from([
            "drivelog",
            "session",
            "--output-dir",
            "/tmp/reports",
            "--format",
            "events",
            "--provider",
            "none",
        ])
        .unwrap();
        match cli.command {
            Command::Session(cmd) => {
                assert_eq!(cmd.output_dir, Some(PathBuf::from("/tmp/reports")));
                assert_eq!(cmd.format, Some(ExportFormatArg::Events));
                assert_eq!(cmd.provider, Some(ProviderArg::None));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_locate_json() {
        let cli = Cli::try_parse_from(["drivelog", "locate", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Locate(LocateCommand { json: true, .. })));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["drivelog", "config", "validate", "-f", "/x/config.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["drivelog", "-c", "/custom/config.toml", "kinds"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["drivelog", "session", "--provider", "wifi"]).is_err());
    }
}
