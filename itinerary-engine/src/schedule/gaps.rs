//! Gap detection and best-effort repair.
//!
//! The filler runs the continuity validator to enumerate candidates, then
//! synthesizes one inferred segment per candidate: a "Free time" activity
//! for an idle stretch between geographically continuous neighbors, or a
//! transfer bridging a geographic jump. Synthesized segments span the
//! whole candidate window, so a second run finds nothing left to fill.
//!
//! Repair is best-effort, not optimization: a candidate the filler cannot
//! bridge (overlapping neighbors, no known place to anchor to) is reported
//! and left alone.

use serde::Serialize;
use tracing::debug;

use crate::domain::{
    InferredReason, Itinerary, Segment, SegmentId, SegmentKind, SegmentSource, TimeSpan,
};

use super::{IssueKind, SchedulePolicy, ValidationReport, stackable, validate};

/// Options for a gap-fill run.
///
/// With `auto_apply` unset (the default) the filler only proposes; the
/// itinerary is never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct GapFillOptions {
    /// Insert synthesized segments instead of returning them as proposals.
    pub auto_apply: bool,
}

/// A synthesized segment and the pair it would bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapProposal {
    /// The inferred segment, spanning the whole candidate window.
    pub segment: Segment,
    /// Segment the window starts at.
    pub upstream: SegmentId,
    /// Segment the window ends at.
    pub downstream: SegmentId,
}

/// A candidate the filler declined or rolled back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFill {
    pub upstream: SegmentId,
    pub downstream: SegmentId,
    /// Why no segment was inserted.
    pub message: String,
}

/// What a gap-fill run did.
///
/// In propose mode `proposals` carries the synthesized segments and the
/// itinerary is untouched. In auto-apply mode `applied` and `skipped`
/// partition the candidates instead, and `report` reflects the itinerary
/// after the accepted fills (partial success: one rolled-back fill does
/// not stop the rest).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapFillOutcome {
    /// Segments inserted (auto-apply mode only).
    pub applied: Vec<Segment>,
    /// Segments synthesized but not inserted (propose mode only).
    pub proposals: Vec<GapProposal>,
    /// Candidates that could not be filled.
    pub skipped: Vec<SkippedFill>,
    /// Validation of the itinerary as the run left it.
    pub report: ValidationReport,
}

/// Detect gaps and synthesize inferred filler segments.
///
/// Candidates come from the validator: an idle-gap warning between
/// geographically compatible neighbors becomes a "Free time" activity
/// anchored at the upstream segment's exit place (or the downstream
/// entry when the upstream has none); a location-jump error becomes a
/// transfer from the upstream exit to the downstream entry, using the
/// policy's default mode. A candidate window already holding an inferred
/// segment, whatever its status, is never refilled: a filler the
/// traveler cancelled must not come back.
///
/// With `auto_apply` set, each synthesized segment is checked against the
/// whole collection before insertion; a fill that would sit on top of a
/// non-stackable segment is dropped and reported in `skipped` while the
/// rest commit. The check scans every effective segment, not just the
/// window's endpoints: a longer segment that started earlier can cover
/// the window without being adjacent to it. When at least one fill
/// commits, the stored segment order is re-sorted chronologically; a run
/// that applies nothing leaves the itinerary untouched.
pub fn fill_gaps(
    itinerary: &mut Itinerary,
    policy: &SchedulePolicy,
    options: GapFillOptions,
) -> GapFillOutcome {
    let sorted = itinerary.sorted_segments();
    let report = validate(&sorted, policy);

    let jumps = pairs_with(&report, IssueKind::LocationJump);
    let idles = pairs_with(&report, IssueKind::IdleGap);

    let mut proposals = Vec::new();
    let mut skipped = Vec::new();

    let effective: Vec<&Segment> = sorted.iter().filter(|s| s.is_effective()).collect();
    for pair in effective.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let key = (a.id, b.id);
        let gap = a.span.gap_until(&b.span);

        if jumps.contains(&key) {
            if gap < chrono::Duration::zero() {
                skipped.push(SkippedFill {
                    upstream: a.id,
                    downstream: b.id,
                    message: format!("{} and {} overlap; nothing to bridge", a.kind, b.kind),
                });
                continue;
            }
            // The validator only reports a jump when both places are known
            let (Some(exit), Some(entry)) = (a.exit_place(), b.entry_place()) else {
                continue;
            };
            let Ok(window) = TimeSpan::new(a.span.end(), b.span.start()) else {
                continue;
            };
            if occupied_by_inferred(&sorted, &window) {
                continue;
            }
            proposals.push(GapProposal {
                segment: filler(
                    SegmentKind::Transfer {
                        pickup: exit.clone(),
                        dropoff: entry.clone(),
                        mode: policy.default_transfer_mode,
                    },
                    window,
                    InferredReason::GeographicGap,
                ),
                upstream: a.id,
                downstream: b.id,
            });
        } else if idles.contains(&key) {
            // Idle gaps are strictly positive, so the window is ordered
            let Ok(window) = TimeSpan::new(a.span.end(), b.span.start()) else {
                continue;
            };
            if occupied_by_inferred(&sorted, &window) {
                continue;
            }
            let Some(anchor) = a.exit_place().or_else(|| b.entry_place()) else {
                skipped.push(SkippedFill {
                    upstream: a.id,
                    downstream: b.id,
                    message: format!(
                        "no known place to anchor free time between {} and {}",
                        a.kind, b.kind
                    ),
                });
                continue;
            };
            proposals.push(GapProposal {
                segment: filler(
                    SegmentKind::Activity {
                        location: anchor.clone(),
                        title: "Free time".into(),
                    },
                    window,
                    InferredReason::TimelineGap,
                ),
                upstream: a.id,
                downstream: b.id,
            });
        }
    }

    if !options.auto_apply {
        debug!(
            proposals = proposals.len(),
            skipped = skipped.len(),
            "gap fill proposed"
        );
        return GapFillOutcome {
            applied: Vec::new(),
            proposals,
            skipped,
            report,
        };
    }

    // Apply one fill at a time so a single bad fill is dropped without
    // losing the rest.
    let mut working = sorted;
    let mut applied = Vec::new();
    for proposal in proposals {
        let collides = working.iter().any(|s| {
            s.is_effective()
                && s.span.overlaps(&proposal.segment.span)
                && !stackable(s, &proposal.segment, policy)
        });
        if collides {
            skipped.push(SkippedFill {
                upstream: proposal.upstream,
                downstream: proposal.downstream,
                message: format!("{} would overlap an existing segment", proposal.segment.kind),
            });
        } else {
            working.push(proposal.segment.clone());
            applied.push(proposal.segment);
        }
    }
    if !applied.is_empty() {
        working.sort_by_key(|s| (s.span.start(), s.span.end()));
        itinerary.segments = working;
    }
    let report = validate(&itinerary.sorted_segments(), policy);

    debug!(
        applied = applied.len(),
        skipped = skipped.len(),
        "gap fill applied"
    );

    GapFillOutcome {
        applied,
        proposals: Vec::new(),
        skipped,
        report,
    }
}

/// Inferred segments whose justification has lapsed.
///
/// An effective inferred segment is justified while removing it would
/// reintroduce the problem it was synthesized for: an idle-gap warning
/// (timeline filler) or a location-jump error (geographic filler) between
/// its effective neighbors. Anything else is stale and returned here for
/// caller-side cleanup; nothing is deleted.
///
/// Precondition: `segments` sorted by start time.
pub fn stale_inferred(segments: &[Segment], policy: &SchedulePolicy) -> Vec<SegmentId> {
    let effective: Vec<&Segment> = segments.iter().filter(|s| s.is_effective()).collect();
    let mut stale = Vec::new();

    for (pos, seg) in effective.iter().enumerate() {
        let Some(reason) = seg.inferred else {
            continue;
        };

        // A filler needs something on both sides to bridge
        let (prev, next) = match (pos.checked_sub(1), effective.get(pos + 1)) {
            (Some(p), Some(next)) => (effective[p], *next),
            _ => {
                stale.push(seg.id);
                continue;
            }
        };

        let remaining: Vec<Segment> = effective
            .iter()
            .filter(|s| s.id != seg.id)
            .map(|s| (*s).clone())
            .collect();
        let report = validate(&remaining, policy);

        let wanted = match reason {
            InferredReason::TimelineGap => IssueKind::IdleGap,
            InferredReason::GeographicGap => IssueKind::LocationJump,
        };
        let justified = report
            .issues
            .iter()
            .any(|i| i.kind == wanted && i.segment_ids == [prev.id, next.id]);
        if !justified {
            stale.push(seg.id);
        }
    }

    stale
}

/// Collect the (upstream, downstream) pairs carrying an issue of `kind`.
fn pairs_with(report: &ValidationReport, kind: IssueKind) -> Vec<(SegmentId, SegmentId)> {
    report
        .issues
        .iter()
        .filter(|i| i.kind == kind)
        .filter_map(|i| match i.segment_ids.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        })
        .collect()
}

/// True when an inferred segment of any status sits in the window.
fn occupied_by_inferred(segments: &[Segment], window: &TimeSpan) -> bool {
    segments
        .iter()
        .any(|s| s.inferred.is_some() && (window.covers(&s.span) || window.overlaps(&s.span)))
}

fn filler(kind: SegmentKind, window: TimeSpan, reason: InferredReason) -> Segment {
    Segment::new(kind, window)
        .with_source(SegmentSource::Agent)
        .with_inferred(reason)
}
