//! Time spans for segments.
//!
//! Every segment occupies a half-open window of absolute time. The span
//! enforces `end >= start` at construction, so downstream arithmetic
//! (gaps, overlaps, shifts) never has to re-check orientation.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use super::DomainError;

/// A time window with `end >= start`, in UTC.
///
/// Zero-length spans are allowed (a synthesized transfer between two
/// back-to-back segments has one).
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use itinerary_engine::domain::TimeSpan;
///
/// let start = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2025, 6, 1, 17, 0, 0).unwrap();
///
/// let span = TimeSpan::new(start, end).unwrap();
/// assert_eq!(span.duration(), Duration::hours(8));
///
/// // A reversed window is rejected
/// assert!(TimeSpan::new(end, start).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct TimeSpan {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSpan {
    /// Create a span, rejecting `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the start instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the end instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the span's length.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the span moved by `delta` (negative moves it earlier),
    /// keeping its duration.
    ///
    /// Fails only when the shifted instants leave chrono's representable
    /// range.
    pub fn shifted(&self, delta: Duration) -> Result<Self, DomainError> {
        let start = self
            .start
            .checked_add_signed(delta)
            .ok_or(DomainError::ShiftOutOfRange)?;
        let end = self
            .end
            .checked_add_signed(delta)
            .ok_or(DomainError::ShiftOutOfRange)?;
        Ok(Self { start, end })
    }

    /// True when the two spans share any interior instant.
    ///
    /// Touching endpoints (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when `other` lies entirely within this span.
    pub fn covers(&self, other: &TimeSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Signed distance from this span's end to the next span's start.
    ///
    /// Positive means idle time between the two; negative means the next
    /// span starts before this one finishes.
    pub fn gap_until(&self, next: &TimeSpan) -> Duration {
        next.start - self.end
    }
}

impl fmt::Debug for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeSpan({} .. {})", self.start, self.end)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}
