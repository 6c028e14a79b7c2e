//! In-memory trip and event store.
//!
//! A [`Session`] lives for one run of the program. Trips are numbered from 1
//! in creation order and never removed; events are appended to the active
//! trip only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::event::Event;

/// Sequence number of a trip (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(u32);

impl TripId {
    /// Wrap a raw sequence number.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw sequence number.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TripId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trip and the events logged during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    id: TripId,
    events: Vec<Event>,
}

impl Trip {
    fn new(id: TripId) -> Self {
        Self {
            id,
            events: Vec::new(),
        }
    }

    /// The trip's sequence number.
    #[must_use]
    pub fn id(&self) -> TripId {
        self.id
    }

    /// Events in the order they were recorded.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events in this trip.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// State of one logging session.
#[derive(Debug, Default)]
pub struct Session {
    trips: Vec<Trip>,
    active: Option<TripId>,
}

/// A session shared between concurrently running captures.
pub type SharedSession = Arc<Mutex<Session>>;

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a session so it can be shared between tasks.
    #[must_use]
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Start a new trip and make it the active one.
    ///
    /// The new trip's id is one more than the number of trips so far.
    pub fn start_trip(&mut self) -> TripId {
        let next = u32::try_from(self.trips.len()).map_or(u32::MAX, |n| n.saturating_add(1));
        let id = TripId::new(next);
        self.trips.push(Trip::new(id));
        self.active = Some(id);
        info!(trip = %id, "Trip started");
        id
    }

    /// Append an event to the active trip.
    ///
    /// `trip` is the trip the event was captured for; it must still be the
    /// active one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] if no trip has been started, or
    /// [`Error::TripNotActive`] if another trip was started since the
    /// capture began. The session is unchanged in both cases.
    pub fn record_event(&mut self, trip: TripId, event: Event) -> Result<()> {
        let active = self.active.ok_or(Error::NoActiveTrip)?;
        if active != trip {
            return Err(Error::TripNotActive { trip, active });
        }

        let target = self
            .trips
            .iter_mut()
            .rev()
            .find(|t| t.id == active)
            .ok_or_else(|| Error::internal(format!("active trip {active} is missing")))?;

        debug!(trip = %active, kind = %event.kind(), "Appending event");
        target.events.push(event);
        Ok(())
    }

    /// Snapshot every trip for export.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToExport`] if no trip has been started.
    pub fn export_snapshot(&self) -> Result<Vec<Trip>> {
        if self.trips.is_empty() {
            return Err(Error::NothingToExport { what: "trips" });
        }
        Ok(self.trips.clone())
    }

    /// All trips, in creation order.
    #[must_use]
    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// The active trip's id, if any.
    #[must_use]
    pub fn active_trip(&self) -> Option<TripId> {
        self.active
    }

    /// Look up a trip by id.
    #[must_use]
    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.iter().find(|t| t.id == id)
    }

    /// Number of trips started.
    #[must_use]
    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    /// Number of events across all trips.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.trips.iter().map(Trip::event_count).sum()
    }

    /// Check whether any trip has been started.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
