//! JSON export of the session log.
//!
//! Exports are a direct serialization of the in-memory shape, pretty-printed
//! with two-space indentation. There is no schema version.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::session::Session;

/// Layout of an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Array of trips, each with its events.
    #[default]
    Trips,
    /// Flat array of every event, in trip order.
    Events,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trips => write!(f, "trips"),
            Self::Events => write!(f, "events"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trips" => Ok(Self::Trips),
            "events" => Ok(Self::Events),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Summary of a written export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Where the file was written.
    pub path: PathBuf,
    /// Layout used.
    pub format: ExportFormat,
    /// Number of trips in the session.
    pub trips: usize,
    /// Number of events written.
    pub events: usize,
    /// Size of the file in bytes.
    pub bytes: usize,
}

/// Render the session as an export document.
///
/// # Errors
///
/// Returns [`Error::NothingToExport`] when the session holds no trips
/// (trip layout) or no events (event layout).
pub fn render(session: &Session, format: ExportFormat) -> Result<String> {
    let json = match format {
        ExportFormat::Trips => serde_json::to_string_pretty(&session.export_snapshot()?)?,
        ExportFormat::Events => {
            let events: Vec<&Event> = session
                .trips()
                .iter()
                .flat_map(|trip| trip.events())
                .collect();
            if events.is_empty() {
                return Err(Error::NothingToExport { what: "events" });
            }
            serde_json::to_string_pretty(&events)?
        }
    };
    Ok(json)
}

/// Writes export files to a fixed directory under fixed names.
#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
    trips_file_name: String,
    events_file_name: String,
}

impl Exporter {
    /// Create an exporter from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: config.export_dir(),
            trips_file_name: config.export.trips_file_name.clone(),
            events_file_name: config.export.events_file_name.clone(),
        }
    }

    /// Point the exporter at another directory.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// The directory exports are written to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The path a given layout is written to.
    #[must_use]
    pub fn target_path(&self, format: ExportFormat) -> PathBuf {
        let name = match format {
            ExportFormat::Trips => &self.trips_file_name,
            ExportFormat::Events => &self.events_file_name,
        };
        self.directory.join(name)
    }

    /// Render the session and write it to the target file.
    ///
    /// Reads the session only; an existing file with the same name is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToExport`] if there is nothing to write, or an
    /// I/O error if the directory or file cannot be written. No file is
    /// created in the first case.
    pub fn export(&self, session: &Session, format: ExportFormat) -> Result<ExportReport> {
        let json = render(session, format)?;
        let path = self.target_path(format);

        if !self.directory.as_os_str().is_empty() && !self.directory.exists() {
            std::fs::create_dir_all(&self.directory).map_err(|source| Error::DirectoryCreate {
                path: self.directory.clone(),
                source,
            })?;
        }

        debug!("Writing export to {}", path.display());
        std::fs::write(&path, json.as_bytes()).map_err(|source| Error::ExportWrite {
            path: path.clone(),
            source,
        })?;

        let report = ExportReport {
            path,
            format,
            trips: session.trip_count(),
            events: session.event_count(),
            bytes: json.len(),
        };
        info!(
            path = %report.path.display(),
            format = %format,
            trips = report.trips,
            events = report.events,
            "Export written"
        );
        Ok(report)
    }
}
