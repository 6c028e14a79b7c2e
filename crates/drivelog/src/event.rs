//! Core event types for drivelog.
//!
//! This module defines the incident kinds a driver can log and the
//! immutable event record produced by each button press.

use serde::{Deserialize, Serialize};

/// The type of driving incident being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    /// Sudden, hard use of the brakes.
    #[serde(alias = "freada_brusca")]
    HardBraking,
    /// Aggressive acceleration.
    #[serde(alias = "aceleracao_forte")]
    HardAcceleration,
    /// A sharp or abrupt turn.
    #[serde(alias = "curva_abrupta")]
    AbruptTurn,
    /// The driver handled a phone while driving.
    #[serde(alias = "mexeu_no_celular")]
    PhoneUse,
    /// Anything else worth noting.
    #[serde(alias = "outro")]
    Other,
}

impl IncidentKind {
    /// All kinds, in button order.
    pub const ALL: [IncidentKind; 5] = [
        Self::HardBraking,
        Self::HardAcceleration,
        Self::AbruptTurn,
        Self::PhoneUse,
        Self::Other,
    ];

    /// The wire name of this kind, as written to exports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HardBraking => "hard_braking",
            Self::HardAcceleration => "hard_acceleration",
            Self::AbruptTurn => "abrupt_turn",
            Self::PhoneUse => "phone_use",
            Self::Other => "other",
        }
    }

    /// Human-readable button label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HardBraking => "Hard braking",
            Self::HardAcceleration => "Hard acceleration",
            Self::AbruptTurn => "Abrupt turn",
            Self::PhoneUse => "Phone use",
            Self::Other => "Other",
        }
    }

    /// The 1-based button number for this kind.
    #[must_use]
    pub fn button(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .map_or(0, |idx| idx + 1)
    }

    /// Look up a kind by its 1-based button number.
    #[must_use]
    pub fn from_button(button: usize) -> Option<Self> {
        button
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

impl std::fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IncidentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('-', "_");
        match needle.as_str() {
            "hard_braking" | "freada_brusca" => Ok(Self::HardBraking),
            "hard_acceleration" | "aceleracao_forte" => Ok(Self::HardAcceleration),
            "abrupt_turn" | "curva_abrupta" => Ok(Self::AbruptTurn),
            "phone_use" | "mexeu_no_celular" => Ok(Self::PhoneUse),
            "other" | "outro" => Ok(Self::Other),
            _ => Err(format!("unknown incident kind: {s}")),
        }
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// A single logged incident.
///
/// Events are immutable once created. On the wire the location is flattened
/// into nullable `latitude`/`longitude` fields; a document carrying only one
/// of the two is rejected on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireEvent", try_from = "WireEvent")]
pub struct Event {
    kind: IncidentKind,
    timestamp: String,
    location: Option<Coordinates>,
}

impl Event {
    /// Create a new event.
    #[must_use]
    pub fn new(kind: IncidentKind, timestamp: String, location: Option<Coordinates>) -> Self {
        Self {
            kind,
            timestamp,
            location,
        }
    }

    /// The kind of incident.
    #[must_use]
    pub fn kind(&self) -> IncidentKind {
        self.kind
    }

    /// Local wall-clock time the button was pressed.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Where the event happened, if the location lookup succeeded.
    #[must_use]
    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Latitude, if located.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|c| c.latitude)
    }

    /// Longitude, if located.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|c| c.longitude)
    }

    /// Check whether this event carries coordinates.
    #[must_use]
    pub fn has_location(&self) -> bool {
        self.location.is_some()
    }
}

#[derive(Serialize, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: IncidentKind,
    timestamp: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<Event> for WireEvent {
    fn from(event: Event) -> Self {
        Self {
            kind: event.kind,
            latitude: event.latitude(),
            longitude: event.longitude(),
            timestamp: event.timestamp,
        }
    }
}

impl TryFrom<WireEvent> for Event {
    type Error = String;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        let location = match (wire.latitude, wire.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            (None, None) => None,
            _ => {
                return Err(
                    "latitude and longitude must be both present or both null".to_string(),
                )
            }
        };
        Ok(Self::new(wire.kind, wire.timestamp, location))
    }
}
