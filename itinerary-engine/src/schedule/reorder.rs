//! Explicit reordering of the stored segment sequence.
//!
//! Reorder changes presentation intent, never clock time: a traveler may
//! group segments by theme or by day rather than by the minute they
//! start. The supplied id list must be a permutation of exactly the
//! current segment ids; anything else is refused before any mutation.
//! Where the new order deviates from chronological order the outcome
//! carries warnings, because the deviation is allowed but worth flagging.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Itinerary, Segment, SegmentId};

use super::{Issue, IssueKind, SchedulePolicy, Severity, ValidationReport, validate};

/// Why a reorder was refused. Nothing is committed on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    #[error("expected {expected} segment ids, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("segment {0} appears more than once")]
    DuplicateSegment(SegmentId),
    #[error("segment {0} is not part of this itinerary")]
    UnknownSegment(SegmentId),
}

/// What a committed reorder found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderOutcome {
    /// Continuity of the underlying timeline plus out-of-sequence
    /// warnings for the stored order.
    pub report: ValidationReport,
}

/// Apply an explicit segment order.
///
/// `order` must list every current segment id exactly once. Segment
/// times are untouched; callers wanting the clock to follow the new
/// order issue cascade moves separately. The returned report validates
/// the timeline as before and adds a warning for each adjacent pair of
/// the stored order that runs against the clock.
pub fn reorder(
    itinerary: &mut Itinerary,
    order: &[SegmentId],
    policy: &SchedulePolicy,
) -> Result<ReorderOutcome, ReorderError> {
    if order.len() != itinerary.segments.len() {
        return Err(ReorderError::LengthMismatch {
            expected: itinerary.segments.len(),
            actual: order.len(),
        });
    }
    let mut seen = HashSet::with_capacity(order.len());
    for id in order {
        if !seen.insert(*id) {
            return Err(ReorderError::DuplicateSegment(*id));
        }
    }

    // Equal length and no duplicates: resolving every id proves the
    // permutation.
    let mut rearranged = Vec::with_capacity(order.len());
    for id in order {
        match itinerary.segment(*id) {
            Some(seg) => rearranged.push(seg.clone()),
            None => return Err(ReorderError::UnknownSegment(*id)),
        }
    }

    let mut report = validate(&itinerary.sorted_segments(), policy);
    report.issues.extend(sequence_warnings(&rearranged));
    itinerary.segments = rearranged;

    debug!(segments = order.len(), "segments reordered");

    Ok(ReorderOutcome { report })
}

/// One warning per adjacent stored pair that runs against the clock.
fn sequence_warnings(segments: &[Segment]) -> Vec<Issue> {
    let effective: Vec<&Segment> = segments.iter().filter(|s| s.is_effective()).collect();
    effective
        .windows(2)
        .filter(|pair| {
            (pair[1].span.start(), pair[1].span.end())
                < (pair[0].span.start(), pair[0].span.end())
        })
        .map(|pair| Issue {
            severity: Severity::Warning,
            kind: IssueKind::OutOfSequence,
            segment_ids: vec![pair[0].id, pair[1].id],
            message: format!(
                "{} is listed before {} but starts later",
                pair[0].kind, pair[1].kind
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Place, SegmentKind, SegmentStatus, TimeSpan};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn ts(day: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, h, 0, 0).unwrap()
    }

    fn span(day: u32, start_h: u32, end_h: u32) -> TimeSpan {
        TimeSpan::new(ts(day, start_h), ts(day, end_h)).unwrap()
    }

    fn activity(title: &str, span: TimeSpan) -> Segment {
        Segment::new(
            SegmentKind::Activity {
                location: Place::named("Paris").with_city("Paris"),
                title: title.into(),
            },
            span,
        )
    }

    fn trip(segments: Vec<Segment>) -> Itinerary {
        let mut it = Itinerary::new(
            "Trip",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            1,
        )
        .unwrap();
        it.segments = segments;
        it
    }

    fn policy() -> SchedulePolicy {
        SchedulePolicy::default()
    }

    #[test]
    fn identity_order_changes_nothing() {
        let a = activity("a", span(1, 9, 10));
        let b = activity("b", span(1, 11, 12));
        let order = vec![a.id, b.id];
        let mut it = trip(vec![a, b]);
        let before = it.clone();

        let outcome = reorder(&mut it, &order, &policy()).unwrap();
        assert_eq!(it, before);
        assert!(outcome.report.is_clean());
    }

    #[test]
    fn explicit_order_wins_over_clock_order() {
        let morning = activity("morning", span(1, 9, 10));
        let evening = activity("evening", span(1, 18, 19));
        let order = vec![evening.id, morning.id];
        let mut it = trip(vec![morning.clone(), evening.clone()]);

        let outcome = reorder(&mut it, &order, &policy()).unwrap();

        // Stored order follows the request, clock times stay put
        assert_eq!(it.segments[0].id, evening.id);
        assert_eq!(it.segments[1].id, morning.id);
        assert_eq!(it.segment(morning.id).unwrap().span, span(1, 9, 10));
        assert_eq!(it.segment(evening.id).unwrap().span, span(1, 18, 19));

        // The deviation is a warning, never an error
        assert!(!outcome.report.has_errors());
        let warning = outcome
            .report
            .warnings()
            .find(|i| i.kind == IssueKind::OutOfSequence)
            .expect("out-of-sequence warning");
        assert_eq!(warning.segment_ids, vec![evening.id, morning.id]);
    }

    #[test]
    fn short_list_is_refused() {
        let a = activity("a", span(1, 9, 10));
        let b = activity("b", span(1, 11, 12));
        let order = vec![a.id];
        let mut it = trip(vec![a, b]);
        let before = it.clone();

        let err = reorder(&mut it, &order, &policy()).unwrap_err();
        assert_eq!(
            err,
            ReorderError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(it, before);
    }

    #[test]
    fn duplicate_id_is_refused() {
        let a = activity("a", span(1, 9, 10));
        let b = activity("b", span(1, 11, 12));
        let order = vec![a.id, a.id];
        let mut it = trip(vec![a, b]);

        let err = reorder(&mut it, &order, &policy()).unwrap_err();
        assert!(matches!(err, ReorderError::DuplicateSegment(id) if id == order[0]));
    }

    #[test]
    fn foreign_id_is_refused() {
        let a = activity("a", span(1, 9, 10));
        let b = activity("b", span(1, 11, 12));
        let ghost = SegmentId::new();
        let order = vec![a.id, ghost];
        let mut it = trip(vec![a, b]);
        let before = it.clone();

        let err = reorder(&mut it, &order, &policy()).unwrap_err();
        assert_eq!(err, ReorderError::UnknownSegment(ghost));
        assert_eq!(it, before);
    }

    #[test]
    fn cancelled_segments_raise_no_sequence_warnings() {
        let a = activity("a", span(1, 9, 10));
        let dropped = activity("dropped", span(1, 14, 15)).with_status(SegmentStatus::Cancelled);
        let b = activity("b", span(1, 11, 12));
        // The cancelled segment is listed out of order, the rest are not
        let order = vec![a.id, dropped.id, b.id];
        let mut it = trip(vec![a, dropped, b]);

        let outcome = reorder(&mut it, &order, &policy()).unwrap();
        assert!(
            outcome
                .report
                .issues
                .iter()
                .all(|i| i.kind != IssueKind::OutOfSequence)
        );
    }

    #[test]
    fn timeline_issues_still_reported() {
        // The underlying timeline has a clash; reordering must keep
        // reporting it.
        let a = activity("a", span(1, 9, 11));
        let b = activity("b", span(1, 10, 12));
        let order = vec![b.id, a.id];
        let mut it = trip(vec![a, b]);

        let outcome = reorder(&mut it, &order, &policy()).unwrap();
        assert!(outcome.report.has_errors());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Place, SegmentKind, TimeSpan};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn arb_trip() -> impl Strategy<Value = Itinerary> {
        prop::collection::vec((30i64..300, 0i64..900), 1..10).prop_map(|rows| {
            let mut cursor = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();
            let mut segments = Vec::new();
            for (i, (len, gap)) in rows.into_iter().enumerate() {
                let span = TimeSpan::new(cursor, cursor + Duration::minutes(len)).unwrap();
                segments.push(Segment::new(
                    SegmentKind::Activity {
                        location: Place::named("Paris").with_city("Paris"),
                        title: format!("a{i}"),
                    },
                    span,
                ));
                cursor = span.end() + Duration::minutes(gap);
            }
            let mut it = Itinerary::new(
                "Trip",
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
                1,
            )
            .unwrap();
            it.segments = segments;
            it
        })
    }

    fn trip_and_shuffle() -> impl Strategy<Value = (Itinerary, Vec<SegmentId>)> {
        arb_trip().prop_flat_map(|it| {
            let ids: Vec<SegmentId> = it.segments.iter().map(|s| s.id).collect();
            (Just(it), Just(ids).prop_shuffle())
        })
    }

    proptest! {
        /// Any permutation is accepted; identities and clock times are
        /// untouched and only the stored order changes
        #[test]
        fn permutations_are_accepted((it, order) in trip_and_shuffle()) {
            let mut it = it;
            let before = it.clone();

            reorder(&mut it, &order, &SchedulePolicy::default()).unwrap();

            let stored: Vec<SegmentId> = it.segments.iter().map(|s| s.id).collect();
            prop_assert_eq!(&stored, &order);
            for seg in &before.segments {
                prop_assert_eq!(it.segment(seg.id).unwrap().span, seg.span);
            }
        }

        /// Anything that is not a permutation is refused untouched
        #[test]
        fn non_permutations_are_refused(
            (it, order) in arb_trip().prop_flat_map(|it| {
                let ids: Vec<SegmentId> = it.segments.iter().map(|s| s.id).collect();
                let mut foreign = ids.clone();
                foreign[0] = SegmentId::new();
                let mut doubled = ids.clone();
                doubled.push(ids[0]);
                let corrupted = prop_oneof![
                    Just(ids[..ids.len() - 1].to_vec()),
                    Just(foreign),
                    Just(doubled),
                ];
                (Just(it), corrupted)
            })
        ) {
            let mut it = it;
            let before = it.clone();
            prop_assert!(reorder(&mut it, &order, &SchedulePolicy::default()).is_err());
            prop_assert_eq!(it, before);
        }
    }
}
