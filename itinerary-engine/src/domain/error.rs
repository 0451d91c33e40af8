//! Domain error types.
//!
//! These errors represent construction and validation failures in the
//! domain layer. They are distinct from storage and operation errors.

use chrono::{DateTime, NaiveDate, Utc};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// A time window ends before it starts
    #[error("window ends before it starts ({end} < {start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A shift pushed a span outside chrono's representable range
    #[error("shift leaves the representable time range")]
    ShiftOutOfRange,

    /// A required title is empty or whitespace-only
    #[error("{0} title cannot be empty")]
    EmptyTitle(&'static str),

    /// Trip end date precedes the start date
    #[error("trip end date {end} precedes start date {start}")]
    TripEndsBeforeStart { start: NaiveDate, end: NaiveDate },

    /// An itinerary must cover at least one traveler
    #[error("traveler count must be at least 1")]
    NoTravelers,
}
