//! The itinerary aggregate: a titled trip holding an ordered segment list.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DomainError, ItineraryId, Segment, SegmentId};

/// Overall status of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TripStatus {
    Draft,
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// A traveler's trip: date range, status, and the ordered segments.
///
/// The stored segment order is the presentation order. It usually matches
/// chronological order but is allowed to deviate (the reorder operation
/// warns rather than rejects). `version` and `updated_at` belong to the
/// storage layer: the store checks the version on save and bumps both.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use itinerary_engine::domain::Itinerary;
///
/// let trip = Itinerary::new(
///     "Paris in June",
///     NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
///     2,
/// )
/// .unwrap();
///
/// assert!(trip.segments.is_empty());
/// assert_eq!(trip.version, 0);
///
/// // A reversed date range is rejected
/// assert!(Itinerary::new(
///     "Backwards",
///     NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
///     2,
/// )
/// .is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// Stable identity of the trip.
    pub id: ItineraryId,
    /// Display title.
    pub title: String,
    /// First day of the trip.
    pub start_date: NaiveDate,
    /// Last day of the trip.
    pub end_date: NaiveDate,
    /// How many people are traveling.
    pub traveler_count: u32,
    /// Segments in presentation order.
    pub segments: Vec<Segment>,
    /// Trip lifecycle status.
    pub status: TripStatus,
    /// Optimistic-concurrency version, bumped by the store on save.
    pub version: u64,
    /// Last save instant, set by the store.
    pub updated_at: DateTime<Utc>,
}

impl Itinerary {
    /// Create an empty draft itinerary.
    ///
    /// Rejects an empty title, a reversed date range, and a zero traveler
    /// count.
    pub fn new(
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        traveler_count: u32,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::EmptyTitle("itinerary"));
        }
        if end_date < start_date {
            return Err(DomainError::TripEndsBeforeStart {
                start: start_date,
                end: end_date,
            });
        }
        if traveler_count == 0 {
            return Err(DomainError::NoTravelers);
        }
        Ok(Self {
            id: ItineraryId::new(),
            title,
            start_date,
            end_date,
            traveler_count,
            segments: Vec::new(),
            status: TripStatus::Draft,
            version: 0,
            updated_at: Utc::now(),
        })
    }

    /// Look up a segment by id.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Look up a segment by id, mutably.
    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.iter_mut().find(|s| s.id == id)
    }

    /// Position of a segment in the stored order.
    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    /// Sort segments chronologically (by start, then end). Stable, so
    /// equal spans keep their stored relative order.
    pub fn sort_segments(&mut self) {
        self.segments
            .sort_by_key(|s| (s.span.start(), s.span.end()));
    }

    /// A chronologically sorted copy of the segments, leaving the stored
    /// (presentation) order untouched. Validation and the dependency graph
    /// always work on this view.
    pub fn sorted_segments(&self) -> Vec<Segment> {
        let mut view = self.segments.clone();
        view.sort_by_key(|s| (s.span.start(), s.span.end()));
        view
    }

    /// True when the stored order is non-decreasing in start time.
    pub fn is_chronological(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| w[0].span.start() <= w[1].span.start())
    }

    /// Reduce the aggregate to its listing row.
    pub fn summary(&self) -> ItinerarySummary {
        ItinerarySummary {
            id: self.id,
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            segment_count: self.segments.len(),
            version: self.version,
            updated_at: self.updated_at,
        }
    }
}

/// Listing row for an itinerary, without its segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItinerarySummary {
    pub id: ItineraryId,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TripStatus,
    pub segment_count: usize,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}
