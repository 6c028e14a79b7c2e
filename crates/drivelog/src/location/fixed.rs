//! Providers that never touch hardware.

use super::{LocationOutcome, LocationProvider, LocationRequest};
use crate::event::Coordinates;

/// Provider with no position source at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

#[async_trait::async_trait]
impl LocationProvider for NullProvider {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn current_position(&self, _request: &LocationRequest) -> LocationOutcome {
        LocationOutcome::Unavailable("no location provider configured".to_string())
    }
}

/// Provider pinned to one position, e.g. a parked test vehicle.
#[derive(Debug, Clone, Copy)]
pub struct FixedProvider {
    position: Coordinates,
}

impl FixedProvider {
    /// Create a provider that always reports `position`.
    #[must_use]
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait::async_trait]
impl LocationProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn current_position(&self, _request: &LocationRequest) -> LocationOutcome {
        LocationOutcome::Resolved(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_provider_is_unavailable() {
        let outcome = NullProvider
            .current_position(&LocationRequest::default())
            .await;
        assert!(matches!(outcome, LocationOutcome::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_fixed_provider_resolves() {
        let provider = FixedProvider::new(Coordinates::new(-23.5, -46.6));
        let outcome = provider.current_position(&LocationRequest::default()).await;
        assert_eq!(outcome.coordinates(), Some(Coordinates::new(-23.5, -46.6)));
    }
}
