//! Segments: the time-boxed building blocks of an itinerary.
//!
//! A segment is one event the traveler attends: a flight, a hotel stay,
//! an activity, a ground transfer, or a free-form entry. All variants
//! share identity, a time span, status, and provenance; the variant
//! payload carries the places involved. The scheduling engine works
//! against the uniform accessors (`span`, `entry_place`, `exit_place`,
//! `moves_traveler`) so it never matches on variants itself.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{DomainError, Place, SegmentId, TimeSpan, TravelerRef};

/// Booking status of a segment.
///
/// Cancelled segments stay in the collection for the record but take no
/// part in continuity checks, gap detection, or the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Tentative,
    Confirmed,
    Waitlisted,
    Cancelled,
    Completed,
}

/// How a segment entered the itinerary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentSource {
    /// Parsed out of a booking confirmation or an external feed.
    Import,
    /// Created by an automated planning step.
    Agent,
    /// Typed in by the traveler.
    Manual,
}

/// Why the gap filler synthesized an inferred segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InferredReason {
    /// Idle time between two segments exceeded the policy threshold.
    TimelineGap,
    /// Consecutive segments sat in different places with nothing bridging them.
    GeographicGap,
}

/// Conveyance used by a transfer segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Ground,
    Rail,
    Ferry,
    Shuttle,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferMode::Ground => "ground",
            TransferMode::Rail => "rail",
            TransferMode::Ferry => "ferry",
            TransferMode::Shuttle => "shuttle",
        };
        f.write_str(s)
    }
}

/// Variant payload of a segment.
///
/// Flights and transfers move the traveler between two places; hotels,
/// activities and custom entries keep the traveler where they are.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SegmentKind {
    Flight {
        origin: Place,
        destination: Place,
        airline: Option<String>,
        flight_number: Option<String>,
    },
    Hotel {
        location: Place,
        property: Option<String>,
    },
    Activity {
        location: Place,
        title: String,
    },
    Transfer {
        pickup: Place,
        dropoff: Place,
        mode: TransferMode,
    },
    Custom {
        title: String,
        location: Option<Place>,
    },
}

impl SegmentKind {
    /// Short lowercase name of the variant, as it appears on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::Flight { .. } => "flight",
            SegmentKind::Hotel { .. } => "hotel",
            SegmentKind::Activity { .. } => "activity",
            SegmentKind::Transfer { .. } => "transfer",
            SegmentKind::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentKind::Flight {
                origin,
                destination,
                flight_number,
                ..
            } => match flight_number {
                Some(number) => write!(f, "flight {number} {origin} → {destination}"),
                None => write!(f, "flight {origin} → {destination}"),
            },
            SegmentKind::Hotel { location, property } => match property {
                Some(property) => write!(f, "hotel {property}"),
                None => write!(f, "hotel {location}"),
            },
            SegmentKind::Activity { title, .. } => write!(f, "activity {title}"),
            SegmentKind::Transfer {
                pickup,
                dropoff,
                mode,
            } => write!(f, "{mode} transfer {pickup} → {dropoff}"),
            SegmentKind::Custom { title, .. } => write!(f, "custom {title}"),
        }
    }
}

/// A single time-boxed entry in an itinerary.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use itinerary_engine::domain::{Place, Segment, SegmentKind, TimeSpan};
///
/// let span = TimeSpan::new(
///     Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2025, 6, 1, 21, 0, 0).unwrap(),
/// )
/// .unwrap();
///
/// let flight = Segment::new(
///     SegmentKind::Flight {
///         origin: Place::named("JFK"),
///         destination: Place::named("CDG"),
///         airline: None,
///         flight_number: Some("AF007".into()),
///     },
///     span,
/// );
///
/// assert!(flight.moves_traveler());
/// assert_eq!(flight.entry_place().unwrap().name, "JFK");
/// assert_eq!(flight.exit_place().unwrap().name, "CDG");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Stable identity, assigned at creation.
    pub id: SegmentId,
    /// Variant payload with the places involved.
    #[serde(flatten)]
    pub kind: SegmentKind,
    /// When the segment occupies the traveler.
    #[serde(flatten)]
    pub span: TimeSpan,
    /// Booking status.
    pub status: SegmentStatus,
    /// How the segment entered the itinerary.
    pub source: SegmentSource,
    /// Present only on segments synthesized by the gap filler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inferred: Option<InferredReason>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Travelers attached to the segment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub travelers: Vec<TravelerRef>,
}

impl Segment {
    /// Create a segment with a fresh id, tentative status, and manual source.
    pub fn new(kind: SegmentKind, span: TimeSpan) -> Self {
        Self {
            id: SegmentId::new(),
            kind,
            span,
            status: SegmentStatus::Tentative,
            source: SegmentSource::Manual,
            inferred: None,
            notes: None,
            travelers: Vec::new(),
        }
    }

    /// Set the booking status.
    pub fn with_status(mut self, status: SegmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the provenance.
    pub fn with_source(mut self, source: SegmentSource) -> Self {
        self.source = source;
        self
    }

    /// Mark the segment as synthesized by the gap filler.
    pub fn with_inferred(mut self, reason: InferredReason) -> Self {
        self.inferred = Some(reason);
        self
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True unless the segment is cancelled.
    pub fn is_effective(&self) -> bool {
        self.status != SegmentStatus::Cancelled
    }

    /// True when the segment carries the traveler to a different place.
    pub fn moves_traveler(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::Flight { .. } | SegmentKind::Transfer { .. }
        )
    }

    /// Place the traveler must be at when the segment starts.
    ///
    /// `None` when the variant carries no location (a custom entry
    /// without one).
    pub fn entry_place(&self) -> Option<&Place> {
        match &self.kind {
            SegmentKind::Flight { origin, .. } => Some(origin),
            SegmentKind::Hotel { location, .. } => Some(location),
            SegmentKind::Activity { location, .. } => Some(location),
            SegmentKind::Transfer { pickup, .. } => Some(pickup),
            SegmentKind::Custom { location, .. } => location.as_ref(),
        }
    }

    /// Place the segment leaves the traveler at when it ends.
    pub fn exit_place(&self) -> Option<&Place> {
        match &self.kind {
            SegmentKind::Flight { destination, .. } => Some(destination),
            SegmentKind::Hotel { location, .. } => Some(location),
            SegmentKind::Activity { location, .. } => Some(location),
            SegmentKind::Transfer { dropoff, .. } => Some(dropoff),
            SegmentKind::Custom { location, .. } => location.as_ref(),
        }
    }

    /// True for lodging, whose span is a container other segments may sit
    /// inside.
    pub fn is_lodging(&self) -> bool {
        matches!(self.kind, SegmentKind::Hotel { .. })
    }

    /// Move the segment in time by `delta`, keeping its duration.
    pub fn shift(&mut self, delta: Duration) -> Result<(), DomainError> {
        self.span = self.span.shifted(delta)?;
        Ok(())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.kind, self.span)
    }
}
