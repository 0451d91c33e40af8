//! The scheduling & consistency engine.
//!
//! This module holds the algorithmic heart of the crate: validating that
//! an ordered segment sequence forms a physically coherent trip, finding
//! and filling timeline/geography gaps, deriving the dependency graph
//! between segments, and propagating a single segment's time change to
//! its dependents.
//!
//! Everything here is pure computation over an in-memory itinerary:
//! no I/O, no retained state between calls. Mutating operations follow
//! compute-then-commit, so a failed operation leaves the aggregate
//! untouched.

mod cascade;
mod config;
mod continuity;
mod gaps;
mod graph;
mod reorder;

pub use cascade::{CascadeMode, MoveError, MoveOutcome, move_segment};
pub use config::SchedulePolicy;
pub use continuity::{Issue, IssueKind, Severity, ValidationReport, stackable, validate};
pub use gaps::{
    GapFillOptions, GapFillOutcome, GapProposal, SkippedFill, fill_gaps, stale_inferred,
};
pub use graph::{DependencyGraph, Edge, EdgeKind};
pub use reorder::{ReorderError, ReorderOutcome, reorder};
