//! Best-effort geolocation.
//!
//! A [`LocationProvider`] answers one position query. [`locate`] wraps the
//! query in the configured timeout and sanity-checks the answer; callers
//! collapse the [`LocationOutcome`] to optional coordinates.

mod fixed;
mod gpsd;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::LocationConfig;
use crate::error::{Error, Result};
use crate::event::Coordinates;

pub use fixed::{FixedProvider, NullProvider};
pub use gpsd::{GpsdProvider, DEFAULT_GPSD_ADDRESS};

/// Which provider answers location queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Never resolves; every event is recorded without coordinates.
    None,
    /// Always resolves to the configured coordinates.
    Fixed,
    /// Asks a local gpsd daemon for the current fix.
    #[default]
    Gpsd,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Fixed => write!(f, "fixed"),
            Self::Gpsd => write!(f, "gpsd"),
        }
    }
}

/// Parameters of a single position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    /// Ask for the most accurate fix the provider can give.
    pub high_accuracy: bool,
    /// Upper bound on how long the query may take.
    pub timeout: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(5000),
        }
    }
}

/// What a position query produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// A position was obtained.
    Resolved(Coordinates),
    /// No answer within the request timeout.
    TimedOut,
    /// The provider refused to answer.
    Denied(String),
    /// The provider could not produce a position.
    Unavailable(String),
}

impl LocationOutcome {
    /// Collapse the outcome to coordinates, discarding the failure reason.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved(coords) => Some(*coords),
            _ => None,
        }
    }

    /// Check whether a position was obtained.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

impl std::fmt::Display for LocationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(coords) => write!(f, "resolved ({coords})"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Denied(reason) => write!(f, "denied: {reason}"),
            Self::Unavailable(reason) => write!(f, "unavailable: {reason}"),
        }
    }
}

/// A source of the device's current position.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync + std::fmt::Debug {
    /// The name of this provider (for logging).
    fn name(&self) -> &'static str;

    /// Query the current position.
    ///
    /// Implementations do not need to enforce `request.timeout`; [`locate`]
    /// does that for them.
    async fn current_position(&self, request: &LocationRequest) -> LocationOutcome;
}

/// Query `provider`, giving up after `request.timeout`.
///
/// Coordinates outside the valid latitude/longitude ranges are reported as
/// unavailable rather than passed on.
pub async fn locate(provider: &dyn LocationProvider, request: &LocationRequest) -> LocationOutcome {
    trace!(
        provider = provider.name(),
        high_accuracy = request.high_accuracy,
        timeout_ms = request.timeout.as_millis(),
        "Requesting position"
    );

    let outcome = match tokio::time::timeout(request.timeout, provider.current_position(request))
        .await
    {
        Ok(LocationOutcome::Resolved(coords)) if !coords.is_valid() => {
            LocationOutcome::Unavailable(format!("provider returned invalid coordinates ({coords})"))
        }
        Ok(outcome) => outcome,
        Err(_) => LocationOutcome::TimedOut,
    };

    debug!(provider = provider.name(), outcome = %outcome, "Position query finished");
    outcome
}

/// Build the provider selected in configuration.
///
/// # Errors
///
/// Returns an error if the fixed provider is selected without valid
/// coordinates.
pub fn provider_from_config(config: &LocationConfig) -> Result<Box<dyn LocationProvider>> {
    match config.provider {
        ProviderKind::None => Ok(Box::new(NullProvider)),
        ProviderKind::Fixed => {
            let (Some(latitude), Some(longitude)) = (config.fixed_latitude, config.fixed_longitude)
            else {
                return Err(Error::config_validation(
                    "fixed provider requires fixed_latitude and fixed_longitude",
                ));
            };
            let coords = Coordinates::new(latitude, longitude);
            if !coords.is_valid() {
                return Err(Error::config_validation(format!(
                    "fixed coordinates out of range: {coords}"
                )));
            }
            Ok(Box::new(FixedProvider::new(coords)))
        }
        ProviderKind::Gpsd => Ok(Box::new(GpsdProvider::new(config.gpsd_address.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct HangingProvider;

    #[async_trait::async_trait]
    impl LocationProvider for HangingProvider {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn current_position(&self, _request: &LocationRequest) -> LocationOutcome {
            std::future::pending::<LocationOutcome>().await
        }
    }

    fn quick_request() -> LocationRequest {
        LocationRequest {
            high_accuracy: true,
            timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_request_default() {
        let request = LocationRequest::default();
        assert!(request.high_accuracy);
        assert_eq!(request.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_outcome_collapse() {
        let coords = Coordinates::new(-23.5, -46.6);
        assert_eq!(LocationOutcome::Resolved(coords).coordinates(), Some(coords));
        assert_eq!(LocationOutcome::TimedOut.coordinates(), None);
        assert_eq!(LocationOutcome::Denied("no".to_string()).coordinates(), None);
        assert_eq!(
            LocationOutcome::Unavailable("off".to_string()).coordinates(),
            None
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(LocationOutcome::TimedOut.to_string(), "timed out");
        assert!(LocationOutcome::Denied("user said no".to_string())
            .to_string()
            .contains("user said no"));
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::None.to_string(), "none");
        assert_eq!(ProviderKind::Fixed.to_string(), "fixed");
        assert_eq!(ProviderKind::Gpsd.to_string(), "gpsd");
    }

    #[tokio::test]
    async fn test_locate_times_out_hanging_provider() {
        let outcome = locate(&HangingProvider, &quick_request()).await;
        assert_eq!(outcome, LocationOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_locate_passes_through_fix() {
        let provider = FixedProvider::new(Coordinates::new(-23.5, -46.6));
        let outcome = locate(&provider, &quick_request()).await;
        assert_eq!(
            outcome,
            LocationOutcome::Resolved(Coordinates::new(-23.5, -46.6))
        );
    }

    #[tokio::test]
    async fn test_locate_rejects_invalid_coordinates() {
        let provider = FixedProvider::new(Coordinates::new(123.0, 0.0));
        let outcome = locate(&provider, &quick_request()).await;
        assert!(matches!(outcome, LocationOutcome::Unavailable(_)));
    }

    #[test]
    fn test_provider_from_config_none() {
        let config = LocationConfig {
            provider: ProviderKind::None,
            ..LocationConfig::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "none");
    }

    #[test]
    fn test_provider_from_config_fixed_requires_coordinates() {
        let config = LocationConfig {
            provider: ProviderKind::Fixed,
            fixed_latitude: Some(-23.5),
            fixed_longitude: None,
            ..LocationConfig::default()
        };
        let err = provider_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("fixed_longitude"));
    }

    #[test]
    fn test_provider_from_config_fixed() {
        let config = LocationConfig {
            provider: ProviderKind::Fixed,
            fixed_latitude: Some(-23.5),
            fixed_longitude: Some(-46.6),
            ..LocationConfig::default()
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(provider.name(), "fixed");
    }

    #[test]
    fn test_provider_from_config_gpsd() {
        let provider = provider_from_config(&LocationConfig::default()).unwrap();
        assert_eq!(provider.name(), "gpsd");
    }
}
