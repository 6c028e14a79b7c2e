//! `drivelog` - A manual logger for driving incidents
//!
//! This library provides the core functionality for recording incidents
//! (hard braking, abrupt turns, phone use and the like) into trips during a
//! session, tagging each with a timestamp and, when available, the current
//! position, and exporting the session log as JSON.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod event;
pub mod export;
pub mod location;
pub mod logging;
pub mod session;

pub use capture::{CaptureReport, CaptureState, EventCapture};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use console::{Console, SessionSummary};
pub use error::{Error, Result};
pub use event::{Coordinates, Event, IncidentKind};
pub use export::{ExportFormat, ExportReport, Exporter};
pub use location::{LocationOutcome, LocationProvider, LocationRequest};
pub use logging::init_logging;
pub use session::{Session, SharedSession, Trip, TripId};
