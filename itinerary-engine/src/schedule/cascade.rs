//! Cascade rescheduling.
//!
//! Moving a segment shifts its dependents by the same delta, so every
//! duration and every inter-segment gap inside the shifted block is
//! preserved exactly. Which segments ride along depends on the mode:
//! `Auto` follows every forward edge of the dependency graph, while
//! `DependenciesOnly` follows location edges alone and deliberately
//! leaves chronologically adjacent but unrelated segments where they
//! are, accepting the gaps and overlaps that may reopen.
//!
//! The move is computed on a scratch copy and committed in one step:
//! a rejected move leaves the itinerary exactly as it was.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{DomainError, Itinerary, Segment, SegmentId};

use super::{
    DependencyGraph, EdgeKind, Issue, IssueKind, SchedulePolicy, Severity, ValidationReport,
    stackable, validate,
};

/// How far a move propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CascadeMode {
    /// Shift everything reachable through any forward edge.
    Auto,
    /// Shift only the segments location-linked to the moved one.
    DependenciesOnly,
}

/// Why a move was refused. Nothing is committed on error.
#[derive(Debug, PartialEq, Error)]
pub enum MoveError {
    #[error("unknown segment {0}")]
    UnknownSegment(SegmentId),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// The move would put a shifted segment on top of one that stays put.
    #[error("move would collide with segments that stay in place")]
    Conflict { conflicts: Vec<Issue> },
}

/// What a committed move did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    /// Ids shifted by the move, target first, in chronological order.
    pub moved: Vec<SegmentId>,
    /// Validation of the itinerary after the move.
    pub report: ValidationReport,
}

/// Move a segment so it starts at `new_start`, cascading per `mode`.
///
/// The target keeps its duration. Dependents shift by the same delta.
/// Segments outside the cascade are never touched.
///
/// A move is refused with [`MoveError::Conflict`] when it would create
/// an overlap between a shifted segment and a stationary one that was
/// not already overlapping: in `Auto` mode any such pair counts, in
/// `DependenciesOnly` mode only the target landing on an upstream
/// segment does, because leaving unrelated segments in conflict is that
/// mode's documented trade-off. Those residual problems are demoted to
/// warnings in the returned report rather than silently dropped.
///
/// A cancelled target moves alone: it holds no time, so nothing depends
/// on it.
pub fn move_segment(
    itinerary: &mut Itinerary,
    segment_id: SegmentId,
    new_start: DateTime<Utc>,
    mode: CascadeMode,
    policy: &SchedulePolicy,
) -> Result<MoveOutcome, MoveError> {
    let original = itinerary.sorted_segments();
    let Some(pos) = original.iter().position(|s| s.id == segment_id) else {
        return Err(MoveError::UnknownSegment(segment_id));
    };

    let delta = new_start - original[pos].span.start();

    let followers: Vec<usize> = if !original[pos].is_effective() {
        Vec::new()
    } else {
        let graph = DependencyGraph::build(&original, policy);
        match mode {
            CascadeMode::Auto => graph.reachable_from(pos, |_| true),
            CascadeMode::DependenciesOnly => {
                graph.reachable_from(pos, |kind| kind == EdgeKind::Location)
            }
        }
    };

    let mut working = original.clone();
    working[pos].shift(delta)?;
    for &i in &followers {
        working[i].shift(delta)?;
    }

    let mut is_shifted = vec![false; working.len()];
    is_shifted[pos] = true;
    for &i in &followers {
        is_shifted[i] = true;
    }

    let conflicts = new_collisions(&original, &working, pos, &is_shifted, mode, policy);
    if !conflicts.is_empty() {
        return Err(MoveError::Conflict { conflicts });
    }

    let moved: Vec<SegmentId> = std::iter::once(pos)
        .chain(followers.iter().copied())
        .map(|i| working[i].id)
        .collect();

    working.sort_by_key(|s| (s.span.start(), s.span.end()));
    let mut report = validate(&working, policy);
    if mode == CascadeMode::DependenciesOnly {
        demote_reopened(&mut report, &original, policy);
    }

    itinerary.segments = working;

    debug!(
        target = %segment_id,
        delta_mins = delta.num_minutes(),
        moved = moved.len(),
        mode = ?mode,
        "cascade move committed"
    );

    Ok(MoveOutcome { moved, report })
}

/// Overlaps this move would introduce between a shifted and a stationary
/// segment.
///
/// Every shifted/stationary combination is checked, not just sorted
/// neighbors: a long stationary segment can swallow a shifted one
/// without ever sitting next to it. Pairs that already overlapped
/// before the move never block it, and stackable pairs are exempt.
fn new_collisions(
    original: &[Segment],
    working: &[Segment],
    pos: usize,
    is_shifted: &[bool],
    mode: CascadeMode,
    policy: &SchedulePolicy,
) -> Vec<Issue> {
    let candidates: Vec<usize> = match mode {
        CascadeMode::Auto => (0..working.len()).filter(|&i| is_shifted[i]).collect(),
        CascadeMode::DependenciesOnly => vec![pos],
    };

    let mut conflicts = Vec::new();
    for &i in &candidates {
        if !working[i].is_effective() {
            continue;
        }
        for j in 0..working.len() {
            if is_shifted[j] || !working[j].is_effective() {
                continue;
            }
            // Dependencies-only rejects on upstream collisions alone
            if mode == CascadeMode::DependenciesOnly && j > pos {
                continue;
            }
            let (s, u) = (&working[i], &working[j]);
            if s.span.overlaps(&u.span)
                && !original[i].span.overlaps(&u.span)
                && !stackable(s, u, policy)
            {
                let (first, second) = if (u.span.start(), u.span.end())
                    <= (s.span.start(), s.span.end())
                {
                    (u, s)
                } else {
                    (s, u)
                };
                conflicts.push(Issue {
                    severity: Severity::Error,
                    kind: IssueKind::Overlap,
                    segment_ids: vec![first.id, second.id],
                    message: format!("{} would overlap {}", s.kind, u.kind),
                });
            }
        }
    }
    conflicts
}

/// Demote errors this move reopened to warnings.
///
/// A dependencies-only move accepts that segments left in place may now
/// clash with the shifted block; those findings stay visible but must
/// not read as hard failures. Anything that was already failing before
/// the move keeps its severity.
fn demote_reopened(report: &mut ValidationReport, original: &[Segment], policy: &SchedulePolicy) {
    let preexisting: HashSet<(IssueKind, SegmentId, SegmentId)> = validate(original, policy)
        .issues
        .iter()
        .filter_map(pair_key)
        .collect();

    for issue in &mut report.issues {
        if issue.severity != Severity::Error {
            continue;
        }
        if let Some(key) = pair_key(issue) {
            if !preexisting.contains(&key) {
                issue.severity = Severity::Warning;
            }
        }
    }
}

fn pair_key(issue: &Issue) -> Option<(IssueKind, SegmentId, SegmentId)> {
    match issue.segment_ids.as_slice() {
        [a, b] if a <= b => Some((issue.kind, *a, *b)),
        [a, b] => Some((issue.kind, *b, *a)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Place, SegmentKind, SegmentStatus, TimeSpan};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, h, m, 0).unwrap()
    }

    fn span(day: u32, start_h: u32, end_h: u32) -> TimeSpan {
        TimeSpan::new(ts(day, start_h, 0), ts(day, end_h, 0)).unwrap()
    }

    fn place(name: &str, city: &str) -> Place {
        Place::named(name).with_city(city)
    }

    fn activity(city: &str, span: TimeSpan) -> Segment {
        Segment::new(
            SegmentKind::Activity {
                location: place(city, city),
                title: "Visit".into(),
            },
            span,
        )
    }

    fn flight(from: &str, from_city: &str, to: &str, to_city: &str, span: TimeSpan) -> Segment {
        Segment::new(
            SegmentKind::Flight {
                origin: place(from, from_city),
                destination: place(to, to_city),
                airline: None,
                flight_number: None,
            },
            span,
        )
    }

    fn hotel(city: &str, span: TimeSpan) -> Segment {
        Segment::new(
            SegmentKind::Hotel {
                location: place(city, city),
                property: None,
            },
            span,
        )
    }

    fn custom(span: TimeSpan) -> Segment {
        Segment::new(
            SegmentKind::Custom {
                title: "Note".into(),
                location: None,
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
        it.sort_segments();
        it
    }

    fn policy() -> SchedulePolicy {
        SchedulePolicy::default()
    }

    #[test]
    fn auto_move_shifts_the_whole_block() {
        // Flight lands in Paris, hotel and museum visit follow. Pulling
        // the flight a day earlier drags both along, gaps intact.
        let jfk_cdg = flight(
            "JFK",
            "New York",
            "CDG",
            "Paris",
            TimeSpan::new(ts(2, 9, 0), ts(2, 21, 0)).unwrap(),
        );
        let stay = hotel("Paris", TimeSpan::new(ts(2, 22, 0), ts(4, 10, 0)).unwrap());
        let museum = activity("Paris", span(3, 14, 16));
        let (flight_id, stay_id, museum_id) = (jfk_cdg.id, stay.id, museum.id);
        let mut it = trip(vec![jfk_cdg, stay, museum]);

        let outcome =
            move_segment(&mut it, flight_id, ts(1, 9, 0), CascadeMode::Auto, &policy())
                .unwrap();

        assert_eq!(outcome.moved, vec![flight_id, stay_id, museum_id]);
        assert!(!outcome.report.has_errors());

        let flight_span = it.segment(flight_id).unwrap().span;
        assert_eq!(flight_span, TimeSpan::new(ts(1, 9, 0), ts(1, 21, 0)).unwrap());
        let stay_span = it.segment(stay_id).unwrap().span;
        assert_eq!(stay_span, TimeSpan::new(ts(1, 22, 0), ts(3, 10, 0)).unwrap());
        let museum_span = it.segment(museum_id).unwrap().span;
        assert_eq!(museum_span, span(2, 14, 16));
    }

    #[test]
    fn dependencies_only_leaves_unrelated_segments() {
        let hop = flight(
            "CDG",
            "Paris",
            "FCO",
            "Rome",
            span(2, 9, 11),
        );
        let note = custom(TimeSpan::new(ts(2, 12, 0), ts(2, 12, 30)).unwrap());
        let forum = activity("Rome", span(2, 14, 16));
        let (hop_id, note_id, forum_id) = (hop.id, note.id, forum.id);
        let mut it = trip(vec![hop, note, forum]);

        let outcome = move_segment(
            &mut it,
            hop_id,
            ts(2, 11, 0),
            CascadeMode::DependenciesOnly,
            &policy(),
        )
        .unwrap();

        // The Rome activity is location-linked and rides along; the note
        // is unrelated and stays, now overlapped by the flight.
        assert_eq!(outcome.moved, vec![hop_id, forum_id]);
        assert_eq!(it.segment(note_id).unwrap().span, TimeSpan::new(ts(2, 12, 0), ts(2, 12, 30)).unwrap());
        assert_eq!(it.segment(forum_id).unwrap().span, span(2, 16, 18));

        // The reopened overlap is surfaced as a warning, not an error
        assert!(!outcome.report.has_errors());
        assert!(
            outcome
                .report
                .warnings()
                .any(|i| i.kind == IssueKind::Overlap)
        );
    }

    #[test]
    fn backward_move_onto_upstream_segment_conflicts() {
        let morning = activity("Paris", span(1, 10, 12));
        let afternoon = activity("Paris", span(1, 14, 16));
        let (morning_id, afternoon_id) = (morning.id, afternoon.id);
        let mut it = trip(vec![morning, afternoon]);
        let before = it.clone();

        let err = move_segment(
            &mut it,
            afternoon_id,
            ts(1, 11, 0),
            CascadeMode::DependenciesOnly,
            &policy(),
        )
        .unwrap_err();

        match err {
            MoveError::Conflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].segment_ids, vec![morning_id, afternoon_id]);
            }
            other => panic!("expected a conflict, got {other:?}"),
        }
        // All-or-nothing: a refused move changes nothing
        assert_eq!(it, before);
    }

    #[test]
    fn auto_conflict_when_a_follower_lands_on_stationary() {
        // The target is lodging and may stack, but the activity dragged
        // along with it may not.
        let rome = activity("Rome", span(1, 10, 12));
        let stay = hotel("Paris", TimeSpan::new(ts(1, 14, 0), ts(2, 10, 0)).unwrap());
        let dinner = activity("Paris", span(1, 17, 19));
        let stay_id = stay.id;
        let mut it = trip(vec![rome, stay, dinner]);
        let before = it.clone();

        let err = move_segment(&mut it, stay_id, ts(1, 8, 0), CascadeMode::Auto, &policy())
            .unwrap_err();

        assert!(matches!(err, MoveError::Conflict { .. }));
        assert_eq!(it, before);
    }

    #[test]
    fn pre_existing_overlap_does_not_block_a_move() {
        // The two morning activities already clash; moving the evening
        // one must not be held hostage by that.
        let a = activity("Paris", span(1, 10, 12));
        let b = activity("Paris", span(1, 11, 13));
        let evening = activity("Paris", span(1, 18, 19));
        let evening_id = evening.id;
        let mut it = trip(vec![a, b, evening]);

        let outcome = move_segment(
            &mut it,
            evening_id,
            ts(1, 20, 0),
            CascadeMode::DependenciesOnly,
            &policy(),
        )
        .unwrap();

        // The old clash keeps its severity: it was not reopened by us
        assert!(outcome.report.has_errors());
    }

    #[test]
    fn forward_move_in_auto_mode_shifts_everything_after() {
        let a = activity("Paris", span(1, 9, 10));
        let b = activity("Paris", span(1, 11, 12));
        let c = activity("Paris", span(1, 13, 14));
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let mut it = trip(vec![a, b, c]);

        let outcome =
            move_segment(&mut it, b_id, ts(1, 15, 0), CascadeMode::Auto, &policy()).unwrap();

        assert_eq!(outcome.moved, vec![b_id, c_id]);
        assert_eq!(it.segment(a_id).unwrap().span, span(1, 9, 10));
        assert_eq!(it.segment(b_id).unwrap().span, span(1, 15, 16));
        assert_eq!(it.segment(c_id).unwrap().span, span(1, 17, 18));
    }

    #[test]
    fn cancelled_target_moves_alone() {
        let a = activity("Paris", span(1, 9, 10));
        let dropped = flight("CDG", "Paris", "FCO", "Rome", span(1, 11, 13))
            .with_status(SegmentStatus::Cancelled);
        let b = activity("Rome", span(1, 15, 16));
        let (a_id, dropped_id, b_id) = (a.id, dropped.id, b.id);
        let mut it = trip(vec![a, dropped, b]);

        let outcome =
            move_segment(&mut it, dropped_id, ts(1, 12, 0), CascadeMode::Auto, &policy())
                .unwrap();

        assert_eq!(outcome.moved, vec![dropped_id]);
        assert_eq!(it.segment(a_id).unwrap().span, span(1, 9, 10));
        assert_eq!(it.segment(b_id).unwrap().span, span(1, 15, 16));
        assert_eq!(it.segment(dropped_id).unwrap().span, span(1, 12, 14));
    }

    #[test]
    fn unknown_segment_is_refused() {
        let mut it = trip(vec![activity("Paris", span(1, 9, 10))]);
        let ghost = SegmentId::new();

        let err =
            move_segment(&mut it, ghost, ts(1, 12, 0), CascadeMode::Auto, &policy()).unwrap_err();
        assert_eq!(err, MoveError::UnknownSegment(ghost));
    }

    #[test]
    fn stored_order_is_chronological_after_the_move() {
        let a = activity("Paris", span(1, 9, 10));
        let b = activity("Paris", span(1, 11, 12));
        let b_id = b.id;
        let mut it = trip(vec![a, b]);

        // Move B before A; only B shifts backwards past A
        move_segment(
            &mut it,
            b_id,
            ts(1, 6, 0),
            CascadeMode::DependenciesOnly,
            &policy(),
        )
        .unwrap();

        assert!(it.is_chronological());
        assert_eq!(it.segments[0].id, b_id);
    }

    #[test]
    fn cascade_mode_is_wire_compatible() {
        assert_eq!(
            serde_json::to_value(CascadeMode::DependenciesOnly).unwrap(),
            serde_json::json!("dependencies-only")
        );
        assert_eq!(
            serde_json::from_str::<CascadeMode>("\"auto\"").unwrap(),
            CascadeMode::Auto
        );
    }
}
