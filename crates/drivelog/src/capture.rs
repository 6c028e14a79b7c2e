//! Event capture: turns a button press into a recorded event.
//!
//! A capture runs in three steps so the session is never locked while the
//! location lookup is pending:
//!
//! 1. [`EventCapture::begin`] checks for an active trip, pins it and stamps
//!    the time.
//! 2. [`EventCapture::locate`] asks the provider for a position, bounded by
//!    the request timeout.
//! 3. [`EventCapture::finish`] builds the event and records it.
//!
//! [`EventCapture::capture`] runs all three against a [`SharedSession`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{Event, IncidentKind};
use crate::location::{self, LocationOutcome, LocationProvider, LocationRequest};
use crate::session::{Session, SharedSession, TripId};

/// Where a single capture is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing has happened yet.
    Idle,
    /// Waiting for the location provider.
    AwaitingLocation,
    /// The provider returned a position.
    LocationResolved,
    /// The provider failed or timed out.
    LocationFailed,
    /// The event is stored in its trip.
    EventRecorded,
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingLocation => write!(f, "awaiting_location"),
            Self::LocationResolved => write!(f, "location_resolved"),
            Self::LocationFailed => write!(f, "location_failed"),
            Self::EventRecorded => write!(f, "event_recorded"),
        }
    }
}

/// A capture that has passed the active-trip check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCapture {
    trip: TripId,
    kind: IncidentKind,
    timestamp: String,
    history: Vec<CaptureState>,
}

impl PendingCapture {
    /// The trip this capture is pinned to.
    #[must_use]
    pub fn trip(&self) -> TripId {
        self.trip
    }

    /// The incident being captured.
    #[must_use]
    pub fn kind(&self) -> IncidentKind {
        self.kind
    }

    /// When the button was pressed.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The state this capture is in now.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.history.last().copied().unwrap_or(CaptureState::Idle)
    }

    fn advance(&mut self, next: CaptureState) {
        debug!(
            trip = %self.trip,
            kind = %self.kind,
            from = %self.state(),
            to = %next,
            "Capture state changed"
        );
        self.history.push(next);
    }
}

/// Result of a completed capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReport {
    /// Trip the event was recorded in.
    pub trip: TripId,
    /// The recorded event.
    pub event: Event,
    /// What the location lookup produced.
    pub outcome: LocationOutcome,
    /// Location state reached before recording.
    pub location_state: CaptureState,
    /// Final state; always [`CaptureState::EventRecorded`].
    pub state: CaptureState,
    /// Every state passed through, starting at [`CaptureState::Idle`].
    pub history: Vec<CaptureState>,
}

/// Turns incident button presses into recorded events.
#[derive(Debug, Clone)]
pub struct EventCapture {
    provider: Arc<dyn LocationProvider>,
    clock: Arc<dyn Clock>,
    request: LocationRequest,
}

impl EventCapture {
    /// Create a capture handler from its collaborators.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        clock: Arc<dyn Clock>,
        request: LocationRequest,
    ) -> Self {
        Self {
            provider,
            clock,
            request,
        }
    }

    /// Create a capture handler using the configured provider and clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or clock configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn LocationProvider> =
            Arc::from(location::provider_from_config(&config.location)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::from_config(&config.clock)?);
        Ok(Self::new(provider, clock, config.location_request()))
    }

    /// The location provider in use.
    #[must_use]
    pub fn provider(&self) -> &dyn LocationProvider {
        self.provider.as_ref()
    }

    /// The request sent with every lookup.
    #[must_use]
    pub fn request(&self) -> LocationRequest {
        self.request
    }

    /// Step 1: check for an active trip and stamp the time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] if no trip has been started.
    pub fn begin(&self, session: &Session, kind: IncidentKind) -> Result<PendingCapture> {
        let Some(trip) = session.active_trip() else {
            warn!(kind = %kind, state = %CaptureState::Idle, "Capture rejected: no active trip");
            return Err(Error::NoActiveTrip);
        };
        let mut pending = PendingCapture {
            trip,
            kind,
            timestamp: self.clock.timestamp(),
            history: vec![CaptureState::Idle],
        };
        debug!(trip = %trip, kind = %kind, timestamp = %pending.timestamp, "Capture started");
        pending.advance(CaptureState::AwaitingLocation);
        Ok(pending)
    }

    /// Step 2: ask for the current position.
    ///
    /// Failures are logged and returned, never raised.
    pub async fn locate(&self, pending: &PendingCapture) -> LocationOutcome {
        let outcome = location::locate(self.provider.as_ref(), &self.request).await;
        if !outcome.is_resolved() {
            warn!(
                trip = %pending.trip,
                kind = %pending.kind,
                provider = self.provider.name(),
                outcome = %outcome,
                "Location not obtained, recording without coordinates"
            );
        }
        outcome
    }

    /// Step 3: build the event and record it in the pinned trip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] or [`Error::TripNotActive`] if the
    /// pinned trip stopped being active while the lookup was pending.
    pub fn finish(
        session: &mut Session,
        mut pending: PendingCapture,
        outcome: LocationOutcome,
    ) -> Result<CaptureReport> {
        let location_state = if outcome.is_resolved() {
            CaptureState::LocationResolved
        } else {
            CaptureState::LocationFailed
        };
        pending.advance(location_state);
        let event = Event::new(pending.kind, pending.timestamp.clone(), outcome.coordinates());

        if let Err(err) = session.record_event(pending.trip, event.clone()) {
            warn!(
                trip = %pending.trip,
                kind = %pending.kind,
                state = %pending.state(),
                error = %err,
                "Event dropped"
            );
            return Err(err);
        }
        pending.advance(CaptureState::EventRecorded);

        info!(
            trip = %pending.trip,
            kind = %event.kind(),
            timestamp = event.timestamp(),
            latitude = ?event.latitude(),
            longitude = ?event.longitude(),
            "New event recorded"
        );
        Ok(CaptureReport {
            trip: pending.trip,
            event,
            outcome,
            location_state,
            state: pending.state(),
            history: pending.history,
        })
    }

    /// Run a full capture against a shared session.
    ///
    /// The session lock is released while the location lookup is pending,
    /// so other captures and trip changes can proceed meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] if no trip is active when called, or
    /// [`Error::TripNotActive`] if a new trip was started before the lookup
    /// finished.
    pub async fn capture(&self, session: &SharedSession, kind: IncidentKind) -> Result<CaptureReport> {
        let pending = self.begin(&*session.lock().await, kind)?;
        let outcome = self.locate(&pending).await;
        Self::finish(&mut *session.lock().await, pending, outcome)
    }
}
