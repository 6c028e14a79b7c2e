//! Wall-clock timestamps in a fixed time zone.

use chrono::{DateTime, FixedOffset, Utc};

use crate::config::ClockConfig;
use crate::error::{Error, Result};

/// Source of event timestamps.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// The current time, already formatted for display and export.
    fn timestamp(&self) -> String;
}

/// Clock backed by the system time, rendered in a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
    format: String,
}

impl SystemClock {
    /// Create a clock from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured offset is out of range.
    pub fn from_config(config: &ClockConfig) -> Result<Self> {
        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::config_validation(format!(
                    "utc_offset_minutes ({}) is out of range",
                    config.utc_offset_minutes
                ))
            })?;
        Ok(Self {
            offset,
            format: config.format.clone(),
        })
    }

    /// Format an instant using this clock's zone and layout.
    #[must_use]
    pub fn format_instant(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(&self.format)
            .to_string()
    }
}

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        self.format_instant(Utc::now())
    }
}

/// Clock that always returns the same string.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}
