//! Error types for drivelog.
//!
//! Most variants here are user-facing conditions ("alerts") rather than
//! faults: a missing trip or an empty export aborts one action but never
//! ends the session.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::TripId;

/// The main error type for drivelog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    /// An event was captured while no trip is active.
    #[error("no active trip: start a trip before recording events")]
    NoActiveTrip,

    /// An event targeted a trip that is no longer the active one.
    #[error("trip {trip} is no longer active (active trip is {active})")]
    TripNotActive {
        /// The trip the event was captured for.
        trip: TripId,
        /// The trip that is active now.
        active: TripId,
    },

    /// An export was requested but there is nothing to write.
    #[error("nothing to export: no {what} recorded yet")]
    NothingToExport {
        /// What is missing ("trips" or "events").
        what: &'static str,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an export file.
    #[error("failed to write export to {path}: {source}")]
    ExportWrite {
        /// Destination of the export.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for drivelog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error means no trip is active.
    #[must_use]
    pub fn is_no_active_trip(&self) -> bool {
        matches!(self, Self::NoActiveTrip)
    }

    /// Check if this error means an export had nothing to write.
    #[must_use]
    pub fn is_nothing_to_export(&self) -> bool {
        matches!(self, Self::NothingToExport { .. })
    }

    /// Check if this error is shown to the user as an alert.
    ///
    /// Alerts abort the current action only; the session keeps running.
    #[must_use]
    pub fn is_user_alert(&self) -> bool {
        matches!(
            self,
            Self::NoActiveTrip | Self::TripNotActive { .. } | Self::NothingToExport { .. }
        )
    }
}
