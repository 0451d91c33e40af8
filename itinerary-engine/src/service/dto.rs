//! Request payloads and response bodies for the operation surface.
//!
//! Requests arrive as raw wire primitives (id strings, untrusted codes
//! and coordinates) and are converted into domain types here, so
//! malformed input fails at the boundary with a validation error.
//! Domain types already serialize in wire form, so responses only exist
//! where an operation answers with a composite (segments plus the
//! aggregate version, an itinerary plus a report).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, Itinerary, LatLon, LocationCode, Place, Segment, SegmentId, SegmentKind,
    SegmentSource, SegmentStatus, TimeSpan, TransferMode, TravelerRef,
};
use crate::schedule::{CascadeMode, GapProposal, SkippedFill, ValidationReport};

use super::OperationError;

/// Request to create an itinerary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItineraryRequest {
    /// Display title.
    pub title: String,

    /// First day of the trip.
    pub start_date: NaiveDate,

    /// Last day of the trip.
    pub end_date: NaiveDate,

    /// How many people are traveling. Defaults to one.
    pub traveler_count: Option<u32>,
}

/// A location as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePayload {
    /// Display name. Required; everything else enriches matching.
    pub name: String,

    /// IATA-style code, normalized and validated on conversion.
    pub code: Option<String>,

    /// Coordinates, validated on conversion.
    pub coords: Option<CoordsPayload>,

    /// City, compared case-insensitively.
    pub city: Option<String>,

    /// Country, compared case-insensitively.
    pub country: Option<String>,
}

/// Raw coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CoordsPayload {
    pub lat: f64,
    pub lon: f64,
}

/// Variant payload of an incoming segment, discriminated by `type`.
///
/// Mirrors the serialized shape of [`SegmentKind`], so a segment read
/// from the API can be edited and submitted back.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SegmentKindPayload {
    Flight {
        origin: PlacePayload,
        destination: PlacePayload,
        airline: Option<String>,
        flight_number: Option<String>,
    },
    Hotel {
        location: PlacePayload,
        property: Option<String>,
    },
    Activity {
        location: PlacePayload,
        title: String,
    },
    Transfer {
        pickup: PlacePayload,
        dropoff: PlacePayload,
        /// Defaults to the policy's transfer mode when absent.
        mode: Option<TransferMode>,
    },
    Custom {
        title: String,
        location: Option<PlacePayload>,
    },
}

/// An incoming segment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPayload {
    /// Variant payload, tagged by `type`.
    #[serde(flatten)]
    pub kind: SegmentKindPayload,

    /// When the segment starts (RFC 3339).
    pub start: DateTime<Utc>,

    /// When the segment ends (RFC 3339).
    pub end: DateTime<Utc>,

    /// Booking status. Defaults to tentative.
    pub status: Option<SegmentStatus>,

    /// Provenance. Defaults to manual entry.
    pub source: Option<SegmentSource>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// Travelers attached to the segment.
    #[serde(default)]
    pub travelers: Vec<String>,
}

/// Partial update of a segment. Absent fields keep their current values;
/// the segment's id, provenance, and inferred flag are never touched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentUpdate {
    /// Full replacement for the variant payload, tagged by `type`.
    pub kind: Option<SegmentKindPayload>,

    /// New start (RFC 3339).
    pub start: Option<DateTime<Utc>>,

    /// New end (RFC 3339).
    pub end: Option<DateTime<Utc>>,

    /// New booking status.
    pub status: Option<SegmentStatus>,

    /// Replacement notes.
    pub notes: Option<String>,

    /// Replacement traveler list.
    pub travelers: Option<Vec<String>>,
}

/// Request to re-sequence an itinerary's segments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    /// The complete new presentation order; must be a permutation of the
    /// current segment ids.
    pub segment_ids: Vec<String>,
}

/// Request to move a segment, cascading through its dependents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSegmentRequest {
    /// New start instant; the segment keeps its duration.
    pub new_start_datetime: DateTime<Utc>,

    /// How far the shift propagates.
    pub cascade_mode: CascadeMode,
}

/// Request to run the gap filler.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillGapsRequest {
    /// Insert synthesized segments instead of proposing them.
    #[serde(default)]
    pub auto_apply: bool,
}

// Conversion implementations

impl PlacePayload {
    pub(crate) fn into_place(self) -> Result<Place, OperationError> {
        let PlacePayload {
            name,
            code,
            coords,
            city,
            country,
        } = self;
        if name.trim().is_empty() {
            return Err(OperationError::Validation(
                "place name cannot be empty".into(),
            ));
        }
        let mut place = Place::named(name);
        if let Some(code) = code {
            place = place.with_code(LocationCode::parse_normalized(&code)?);
        }
        if let Some(coords) = coords {
            place = place.with_coords(LatLon::new(coords.lat, coords.lon)?);
        }
        if let Some(city) = city {
            place = place.with_city(city);
        }
        if let Some(country) = country {
            place = place.with_country(country);
        }
        Ok(place)
    }
}

impl SegmentKindPayload {
    pub(crate) fn into_kind(
        self,
        default_mode: TransferMode,
    ) -> Result<SegmentKind, OperationError> {
        Ok(match self {
            SegmentKindPayload::Flight {
                origin,
                destination,
                airline,
                flight_number,
            } => SegmentKind::Flight {
                origin: origin.into_place()?,
                destination: destination.into_place()?,
                airline,
                flight_number,
            },
            SegmentKindPayload::Hotel { location, property } => SegmentKind::Hotel {
                location: location.into_place()?,
                property,
            },
            SegmentKindPayload::Activity { location, title } => {
                if title.trim().is_empty() {
                    return Err(DomainError::EmptyTitle("activity").into());
                }
                SegmentKind::Activity {
                    location: location.into_place()?,
                    title,
                }
            }
            SegmentKindPayload::Transfer {
                pickup,
                dropoff,
                mode,
            } => SegmentKind::Transfer {
                pickup: pickup.into_place()?,
                dropoff: dropoff.into_place()?,
                mode: mode.unwrap_or(default_mode),
            },
            SegmentKindPayload::Custom { title, location } => {
                if title.trim().is_empty() {
                    return Err(DomainError::EmptyTitle("custom segment").into());
                }
                SegmentKind::Custom {
                    title,
                    location: location.map(PlacePayload::into_place).transpose()?,
                }
            }
        })
    }
}

impl SegmentPayload {
    pub(crate) fn into_segment(
        self,
        default_mode: TransferMode,
    ) -> Result<Segment, OperationError> {
        let span = TimeSpan::new(self.start, self.end)?;
        let mut segment = Segment::new(self.kind.into_kind(default_mode)?, span);
        if let Some(status) = self.status {
            segment.status = status;
        }
        if let Some(source) = self.source {
            segment.source = source;
        }
        if let Some(notes) = self.notes {
            segment.notes = Some(notes);
        }
        for raw in self.travelers {
            segment.travelers.push(TravelerRef::new(raw)?);
        }
        Ok(segment)
    }
}

impl SegmentUpdate {
    /// Apply onto an existing segment.
    ///
    /// May leave the segment partially updated on error; callers apply
    /// updates to a loaded copy that is dropped unless the whole
    /// operation succeeds.
    pub(crate) fn apply_to(
        self,
        segment: &mut Segment,
        default_mode: TransferMode,
    ) -> Result<(), OperationError> {
        if let Some(kind) = self.kind {
            segment.kind = kind.into_kind(default_mode)?;
        }
        let start = self.start.unwrap_or_else(|| segment.span.start());
        let end = self.end.unwrap_or_else(|| segment.span.end());
        segment.span = TimeSpan::new(start, end)?;
        if let Some(status) = self.status {
            segment.status = status;
        }
        if let Some(notes) = self.notes {
            segment.notes = Some(notes);
        }
        if let Some(travelers) = self.travelers {
            segment.travelers = travelers
                .into_iter()
                .map(TravelerRef::new)
                .collect::<Result<_, _>>()?;
        }
        Ok(())
    }
}

// Response bodies

/// A single segment plus the aggregate version after the operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResponse {
    pub segment: Segment,
    pub version: u64,
    /// Advisory validation of the itinerary after the change. Writes are
    /// permissive; problems are reported, not enforced.
    pub report: ValidationReport,
    /// Inferred segments the change left unjustified. Flagged for
    /// caller-side cleanup, never deleted automatically.
    pub stale_inferred: Vec<SegmentId>,
}

/// The segment list in stored (presentation) order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentListResponse {
    pub segments: Vec<Segment>,
    pub version: u64,
}

/// What a delete left behind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSegmentResponse {
    /// Id of the removed segment.
    pub removed: SegmentId,
    pub version: u64,
    /// Advisory validation of what remains.
    pub report: ValidationReport,
    /// Inferred segments the removal left unjustified. Flagged for
    /// caller-side cleanup, never deleted automatically.
    pub stale_inferred: Vec<SegmentId>,
}

/// The re-sequenced segments plus the validation of the new order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderResponse {
    pub segments: Vec<Segment>,
    pub version: u64,
    pub report: ValidationReport,
}

/// The itinerary after a cascade move.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveSegmentResponse {
    pub itinerary: Itinerary,
    /// Ids shifted by the move, target first, in chronological order.
    pub moved: Vec<SegmentId>,
    pub report: ValidationReport,
    /// Inferred segments the move left unjustified.
    pub stale_inferred: Vec<SegmentId>,
}

/// The itinerary after a gap-fill run, with what the run did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillGapsResponse {
    pub itinerary: Itinerary,
    /// Segments inserted (auto-apply only).
    pub applied: Vec<Segment>,
    /// Segments synthesized but not inserted (propose mode only).
    pub proposals: Vec<GapProposal>,
    /// Candidates that could not be filled.
    pub skipped: Vec<SkippedFill>,
    pub report: ValidationReport,
}

/// Continuity report plus housekeeping signals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub report: ValidationReport,
    /// Inferred segments whose justification has lapsed.
    pub stale_inferred: Vec<SegmentId>,
}
