//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Interactive session arguments.
#[derive(Debug, Args)]
pub struct SessionCommand {
    /// Directory to write exports to (overrides config)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Default export layout (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormatArg>,

    /// Location provider (overrides config)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,
}

/// One-shot location query arguments.
#[derive(Debug, Args)]
pub struct LocateCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Location provider (overrides config)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Export layout argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// Trips with nested events
    Trips,
    /// Flat list of events
    Events,
}

impl From<ExportFormatArg> for crate::export::ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Trips => Self::Trips,
            ExportFormatArg::Events => Self::Events,
        }
    }
}

/// Location provider argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Record every event without coordinates
    None,
    /// Use the configured fixed coordinates
    Fixed,
    /// Ask a local gpsd daemon
    Gpsd,
}

impl From<ProviderArg> for crate::location::ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::None => Self::None,
            ProviderArg::Fixed => Self::Fixed,
            ProviderArg::Gpsd => Self::Gpsd,
        }
    }
}
