//! Continuity validation across a segment sequence.
//!
//! The validator walks consecutive pairs of effective (non-cancelled)
//! segments in chronological order and reports three families of issues:
//! overlapping time, geographic jumps, and idle gaps. It never mutates
//! anything; repair is the gap filler's job.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::{PlaceMatch, Segment, SegmentId, SegmentKind, TimeSpan};

use super::SchedulePolicy;

/// How serious an issue is.
///
/// Errors are real inconsistencies; warnings are advisory (idle time,
/// deliberate non-chronological order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What family of problem an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Consecutive segments share interior time and may not stack.
    Overlap,
    /// The traveler would have to jump between places with nothing
    /// bridging them.
    LocationJump,
    /// Idle time beyond the policy threshold; a gap-fill candidate.
    IdleGap,
    /// Stored order deviates from chronological order.
    OutOfSequence,
}

/// One finding from the validator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Segments involved, in sequence order.
    pub segment_ids: Vec<SegmentId>,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Everything the validator found, in sequence order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// True when nothing was found at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when at least one error-severity issue was found.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Error-severity issues only.
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Warning-severity issues only.
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }
}

/// True when two segments may deliberately share time.
///
/// Lodging is a container span: anything may sit inside a hotel stay.
/// Two custom entries may overlap when the policy allows it.
pub fn stackable(a: &Segment, b: &Segment, policy: &SchedulePolicy) -> bool {
    if a.is_lodging() || b.is_lodging() {
        return true;
    }
    policy.allow_custom_overlap
        && matches!(a.kind, SegmentKind::Custom { .. })
        && matches!(b.kind, SegmentKind::Custom { .. })
}

/// Validate a chronologically sorted segment sequence.
///
/// Cancelled segments are skipped entirely: a cancelled flight holds no
/// time or place, so it must not fail continuity for its neighbors.
///
/// Checks per consecutive effective pair (A, B):
/// - overlap: error when B starts inside A, unless the pair is stackable;
/// - geography: error when A's exit and B's entry are both known and
///   demonstrably apart (an in-between transit segment bridges naturally,
///   because its entry is its pickup and its exit is its dropoff);
/// - idle gap: warning when the idle time exceeds the policy threshold
///   and no lodging span covers the whole gap window.
///
/// Precondition: `segments` sorted by start time; the service layer sorts
/// its working view before calling. Pure.
pub fn validate(segments: &[Segment], policy: &SchedulePolicy) -> ValidationReport {
    let effective: Vec<&Segment> = segments.iter().filter(|s| s.is_effective()).collect();
    let mut issues = Vec::new();

    for pair in effective.windows(2) {
        let (a, b) = (pair[0], pair[1]);

        if b.span.start() < a.span.end() && !stackable(a, b, policy) {
            issues.push(Issue {
                severity: Severity::Error,
                kind: IssueKind::Overlap,
                segment_ids: vec![a.id, b.id],
                message: format!("{} overlaps {}", a.kind, b.kind),
            });
        }

        if let (Some(exit), Some(entry)) = (a.exit_place(), b.entry_place()) {
            if exit.matches(entry, policy.proximity_km) == PlaceMatch::Discontinuous {
                issues.push(Issue {
                    severity: Severity::Error,
                    kind: IssueKind::LocationJump,
                    segment_ids: vec![a.id, b.id],
                    message: format!(
                        "{} ends at {} but {} starts at {}",
                        a.kind, exit, b.kind, entry
                    ),
                });
            }
        }

        let gap = a.span.gap_until(&b.span);
        if gap > policy.max_idle_gap() && !lodging_covers_gap(&effective, a, b) {
            issues.push(Issue {
                severity: Severity::Warning,
                kind: IssueKind::IdleGap,
                segment_ids: vec![a.id, b.id],
                message: format!(
                    "{} idle between {} and {}",
                    human_duration(gap),
                    a.kind,
                    b.kind
                ),
            });
        }
    }

    debug!(
        segments = effective.len(),
        issues = issues.len(),
        "continuity validated"
    );

    ValidationReport { issues }
}

/// A night at a booked hotel is not idle time: when some lodging span
/// covers the whole window between A's end and B's start, the gap is
/// accounted for.
fn lodging_covers_gap(effective: &[&Segment], a: &Segment, b: &Segment) -> bool {
    let Ok(window) = TimeSpan::new(a.span.end(), b.span.start()) else {
        return false;
    };
    effective
        .iter()
        .any(|s| s.is_lodging() && s.span.covers(&window))
}

fn human_duration(d: chrono::Duration) -> String {
    let mins = d.num_minutes();
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 && m > 0 {
        format!("{h}h{m:02}m")
    } else if h > 0 {
        format!("{h}h")
    } else {
        format!("{m}m")
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::Place;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn chain(lengths: &[i64], gaps: &[i64]) -> Vec<Segment> {
        let mut cursor = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let mut out = Vec::new();
        for (i, len) in lengths.iter().enumerate() {
            let start = cursor;
            let end = start + Duration::minutes(*len);
            out.push(Segment::new(
                SegmentKind::Activity {
                    location: Place::named("Paris").with_city("Paris"),
                    title: format!("a{i}"),
                },
                TimeSpan::new(start, end).unwrap(),
            ));
            let gap = gaps.get(i).copied().unwrap_or(0);
            cursor = end + Duration::minutes(gap);
        }
        out
    }

    proptest! {
        /// A same-city chain with gaps under the threshold is always clean
        #[test]
        fn tight_chain_is_clean(
            lengths in prop::collection::vec(1i64..300, 1..12),
            gaps in prop::collection::vec(0i64..360, 1..12),
        ) {
            let segments = chain(&lengths, &gaps);
            let report = validate(&segments, &SchedulePolicy::default());
            prop_assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
        }

        /// Every reported id refers to a segment in the input
        #[test]
        fn issues_reference_input_ids(
            lengths in prop::collection::vec(1i64..600, 2..10),
            gaps in prop::collection::vec(0i64..2000, 2..10),
        ) {
            let segments = chain(&lengths, &gaps);
            let report = validate(&segments, &SchedulePolicy::default());
            for issue in &report.issues {
                for id in &issue.segment_ids {
                    prop_assert!(segments.iter().any(|s| s.id == *id));
                }
            }
        }

        /// Validation is deterministic
        #[test]
        fn deterministic(
            lengths in prop::collection::vec(1i64..600, 2..10),
            gaps in prop::collection::vec(0i64..2000, 2..10),
        ) {
            let segments = chain(&lengths, &gaps);
            let policy = SchedulePolicy::default();
            prop_assert_eq!(validate(&segments, &policy), validate(&segments, &policy));
        }
    }
}
