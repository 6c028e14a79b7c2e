//! Diagnostics for drivelog.
//!
//! Logs go to stderr; stdout belongs to the console prompts and alerts, so
//! the two can be redirected separately. Our own crate logs at the level
//! picked on the command line while dependencies stay at `warn`. A valid
//! `RUST_LOG` replaces the whole filter.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary logs, from `-q` up to `-vv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Trips started, events recorded, exports written.
    #[default]
    Normal,
    /// Capture state changes and provider results.
    Verbose,
    /// Everything, including raw gpsd traffic.
    Trace,
}

impl Verbosity {
    /// Pick a verbosity from `-v` count and `--quiet`.
    ///
    /// `--quiet` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Filter directives used when `RUST_LOG` is absent or invalid.
    #[must_use]
    pub fn directives(self) -> String {
        let (deps, own) = match self {
            Self::Quiet => ("error", "error"),
            Self::Normal => ("warn", "info"),
            Self::Verbose => ("warn", "debug"),
            Self::Trace => ("warn", "trace"),
        };
        format!("{deps},drivelog={own}")
    }
}

/// Build the filter from `RUST_LOG` (when it parses) or the verbosity.
fn build_filter(verbosity: Verbosity, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(verbosity.directives()))
}

/// Install the global subscriber.
///
/// Call once from `main`; later calls are ignored. Event targets are shown
/// from `-v` upwards, and colors only when stderr is a terminal.
///
/// # Examples
///
/// ```no_run
/// use drivelog::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(verbosity, rust_log.as_deref());

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbosity >= Verbosity::Verbose)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

/// Route drivelog's warnings into the test harness output.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("drivelog=warn"))
        .with_test_writer()
        .try_init();
}
