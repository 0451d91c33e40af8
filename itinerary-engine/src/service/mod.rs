//! The operation surface a routing layer calls into.
//!
//! Each operation loads the aggregate from the store, runs the scheduling
//! engine against it, and saves the result. The engine itself is stateless
//! between calls; optimistic concurrency lives in the store's version
//! check, and every failure comes back as a typed [`OperationError`] the
//! caller maps to a status.

mod dto;
mod error;

pub use dto::*;
pub use error::OperationError;

use tracing::debug;

use crate::domain::{Itinerary, ItineraryId, ItinerarySummary, SegmentId};
use crate::schedule::{self, GapFillOptions, SchedulePolicy, ValidationReport};
use crate::store::ItineraryStore;

/// Itinerary operations over a store and a scheduling policy.
pub struct ItineraryService<S> {
    store: S,
    policy: SchedulePolicy,
}

impl<S: ItineraryStore> ItineraryService<S> {
    /// Create a service over the given store and policy.
    pub fn new(store: S, policy: SchedulePolicy) -> Self {
        Self { store, policy }
    }

    /// The policy the scheduling engine runs under.
    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    /// Create an empty itinerary.
    pub fn create_itinerary(
        &self,
        req: CreateItineraryRequest,
    ) -> Result<Itinerary, OperationError> {
        let trip = Itinerary::new(
            req.title,
            req.start_date,
            req.end_date,
            req.traveler_count.unwrap_or(1),
        )?;
        let saved = self.store.save(trip)?;
        debug!(itinerary = %saved.id, title = %saved.title, "itinerary created");
        Ok(saved)
    }

    /// Fetch a whole itinerary.
    pub fn itinerary(&self, id: &str) -> Result<Itinerary, OperationError> {
        self.load(id)
    }

    /// List all itineraries as summaries.
    pub fn list_itineraries(&self) -> Result<Vec<ItinerarySummary>, OperationError> {
        Ok(self.store.list()?)
    }

    /// Delete an itinerary.
    pub fn delete_itinerary(&self, id: &str) -> Result<(), OperationError> {
        let id = ItineraryId::parse(id)?;
        self.store.delete(id)?;
        debug!(itinerary = %id, "itinerary deleted");
        Ok(())
    }

    /// The segment list in stored (presentation) order.
    pub fn segments(&self, itinerary_id: &str) -> Result<SegmentListResponse, OperationError> {
        let trip = self.load(itinerary_id)?;
        Ok(SegmentListResponse {
            segments: trip.segments,
            version: trip.version,
        })
    }

    /// Add a segment.
    ///
    /// When the stored order is chronological the new segment is slotted
    /// into its time position; an order the traveler rearranged by hand is
    /// preserved, with the new segment appended at the end. The write is
    /// permissive: continuity problems it introduces come back in the
    /// response report rather than blocking the add.
    pub fn add_segment(
        &self,
        itinerary_id: &str,
        payload: SegmentPayload,
    ) -> Result<SegmentResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let segment = payload.into_segment(self.policy.default_transfer_mode)?;
        let echo = segment.clone();
        let keep_sorted = trip.is_chronological();
        trip.segments.push(segment);
        if keep_sorted {
            trip.sort_segments();
        }
        let saved = self.store.save(trip)?;
        let (report, stale_inferred) = self.outcome_signals(&saved);
        debug!(
            itinerary = %saved.id,
            segment = %echo.id,
            kind = echo.kind.label(),
            "segment added"
        );
        Ok(SegmentResponse {
            segment: echo,
            version: saved.version,
            report,
            stale_inferred,
        })
    }

    /// Update fields of a segment. Identity, provenance, and the inferred
    /// flag survive every update.
    pub fn update_segment(
        &self,
        itinerary_id: &str,
        segment_id: &str,
        update: SegmentUpdate,
    ) -> Result<SegmentResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let segment_id = SegmentId::parse(segment_id)?;
        let Some(segment) = trip.segment_mut(segment_id) else {
            return Err(OperationError::NotFound(format!(
                "segment {segment_id} not found"
            )));
        };
        update.apply_to(segment, self.policy.default_transfer_mode)?;
        let echo = segment.clone();
        let saved = self.store.save(trip)?;
        let (report, stale_inferred) = self.outcome_signals(&saved);
        debug!(itinerary = %saved.id, segment = %segment_id, "segment updated");
        Ok(SegmentResponse {
            segment: echo,
            version: saved.version,
            report,
            stale_inferred,
        })
    }

    /// Remove a segment.
    ///
    /// Inferred segments the removal leaves unjustified are flagged in the
    /// response for the caller to clean up; they are never deleted here.
    pub fn delete_segment(
        &self,
        itinerary_id: &str,
        segment_id: &str,
    ) -> Result<DeleteSegmentResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let segment_id = SegmentId::parse(segment_id)?;
        let Some(pos) = trip.position(segment_id) else {
            return Err(OperationError::NotFound(format!(
                "segment {segment_id} not found"
            )));
        };
        trip.segments.remove(pos);
        let saved = self.store.save(trip)?;
        let (report, stale_inferred) = self.outcome_signals(&saved);
        debug!(
            itinerary = %saved.id,
            segment = %segment_id,
            stale = stale_inferred.len(),
            "segment deleted"
        );
        Ok(DeleteSegmentResponse {
            removed: segment_id,
            version: saved.version,
            report,
            stale_inferred,
        })
    }

    /// Apply an explicit presentation order.
    pub fn reorder_segments(
        &self,
        itinerary_id: &str,
        req: ReorderRequest,
    ) -> Result<ReorderResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let mut order = Vec::with_capacity(req.segment_ids.len());
        for raw in &req.segment_ids {
            order.push(SegmentId::parse(raw)?);
        }
        let outcome = schedule::reorder(&mut trip, &order, &self.policy)?;
        let saved = self.store.save(trip)?;
        debug!(
            itinerary = %saved.id,
            segments = saved.segments.len(),
            "segments reordered"
        );
        Ok(ReorderResponse {
            segments: saved.segments,
            version: saved.version,
            report: outcome.report,
        })
    }

    /// Move a segment to a new start, cascading per the requested mode.
    /// All-or-nothing: a conflict leaves the stored itinerary untouched.
    pub fn move_segment(
        &self,
        itinerary_id: &str,
        segment_id: &str,
        req: MoveSegmentRequest,
    ) -> Result<MoveSegmentResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let segment_id = SegmentId::parse(segment_id)?;
        let outcome = schedule::move_segment(
            &mut trip,
            segment_id,
            req.new_start_datetime,
            req.cascade_mode,
            &self.policy,
        )?;
        let saved = self.store.save(trip)?;
        let stale_inferred = schedule::stale_inferred(&saved.sorted_segments(), &self.policy);
        debug!(
            itinerary = %saved.id,
            segment = %segment_id,
            moved = outcome.moved.len(),
            "segment moved"
        );
        Ok(MoveSegmentResponse {
            itinerary: saved,
            moved: outcome.moved,
            report: outcome.report,
            stale_inferred,
        })
    }

    /// Run the gap filler. Propose mode never touches the store; auto-apply
    /// saves only when at least one fill committed.
    pub fn fill_gaps(
        &self,
        itinerary_id: &str,
        req: FillGapsRequest,
    ) -> Result<FillGapsResponse, OperationError> {
        let mut trip = self.load(itinerary_id)?;
        let outcome = schedule::fill_gaps(
            &mut trip,
            &self.policy,
            GapFillOptions {
                auto_apply: req.auto_apply,
            },
        );
        let trip = if outcome.applied.is_empty() {
            trip
        } else {
            self.store.save(trip)?
        };
        Ok(FillGapsResponse {
            itinerary: trip,
            applied: outcome.applied,
            proposals: outcome.proposals,
            skipped: outcome.skipped,
            report: outcome.report,
        })
    }

    /// Validate continuity and report housekeeping signals, without
    /// mutating anything.
    pub fn validate_itinerary(
        &self,
        itinerary_id: &str,
    ) -> Result<ValidateResponse, OperationError> {
        let trip = self.load(itinerary_id)?;
        let sorted = trip.sorted_segments();
        Ok(ValidateResponse {
            report: schedule::validate(&sorted, &self.policy),
            stale_inferred: schedule::stale_inferred(&sorted, &self.policy),
        })
    }

    fn load(&self, id: &str) -> Result<Itinerary, OperationError> {
        let id = ItineraryId::parse(id)?;
        Ok(self.store.get(id)?)
    }

    /// Advisory signals every mutating outcome carries: the validator's
    /// findings on the time-sorted view and the inferred segments whose
    /// justification has lapsed.
    fn outcome_signals(&self, trip: &Itinerary) -> (ValidationReport, Vec<SegmentId>) {
        let sorted = trip.sorted_segments();
        (
            schedule::validate(&sorted, &self.policy),
            schedule::stale_inferred(&sorted, &self.policy),
        )
    }
}
