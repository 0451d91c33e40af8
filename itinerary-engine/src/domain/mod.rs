//! Domain types for the itinerary engine.
//!
//! This module contains the core domain model: itineraries, segments,
//! places, spans, and their identifiers. Types enforce their invariants
//! at construction time, so code that receives them can trust a span's
//! orientation, a code's shape, and an id's form.

mod error;
mod id;
mod itinerary;
mod place;
mod segment;
mod span;

pub use error::DomainError;
pub use id::{InvalidId, ItineraryId, SegmentId, TravelerRef};
pub use itinerary::{Itinerary, ItinerarySummary, TripStatus};
pub use place::{
    InvalidCoordinates, InvalidLocationCode, LatLon, LocationCode, Place, PlaceMatch,
};
pub use segment::{
    InferredReason, Segment, SegmentKind, SegmentSource, SegmentStatus, TransferMode,
};
pub use span::TimeSpan;
