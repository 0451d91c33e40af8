//! Dependency graph over a segment sequence.
//!
//! The graph is derived, never stored: it is rebuilt from the
//! chronologically sorted segment slice whenever a structural operation
//! needs it. Two kinds of edges exist. The chronology chain links every
//! effective segment to the one after it. Location edges run from each
//! transit segment (flight or transfer) to the following segments that
//! happen at the place it delivered the traveler to, stopping at the next
//! transit segment, which resets the location.

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::{PlaceMatch, Segment};

use super::SchedulePolicy;

/// Why one segment depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The downstream segment simply follows the upstream in time.
    Chronology,
    /// The downstream segment happens at the place a transit segment
    /// delivered the traveler to.
    Location,
}

/// A forward dependency between two positions in the sorted sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
}

/// Dependency graph over a chronologically sorted segment slice.
///
/// Indices refer to positions in the slice the graph was built from.
/// Edges always point forward, so the graph is acyclic by construction.
/// Cancelled segments take no part: no edges in, none out.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    edges: Vec<Edge>,
    /// `adjacency[i]` lists `(target, kind)` for edges leaving `i`.
    adjacency: Vec<Vec<(usize, EdgeKind)>>,
}

impl DependencyGraph {
    /// Build the graph for a sorted segment slice.
    ///
    /// Precondition: `segments` sorted by start time.
    pub fn build(segments: &[Segment], policy: &SchedulePolicy) -> Self {
        let mut edges = Vec::new();

        let effective: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_effective())
            .map(|(i, _)| i)
            .collect();

        for pair in effective.windows(2) {
            edges.push(Edge {
                from: pair[0],
                to: pair[1],
                kind: EdgeKind::Chronology,
            });
        }

        for (pos, &i) in effective.iter().enumerate() {
            if !segments[i].moves_traveler() {
                continue;
            }
            let Some(delivered) = segments[i].exit_place() else {
                continue;
            };
            for &j in &effective[pos + 1..] {
                if segments[j].moves_traveler() {
                    // The next transit resets the traveler's location
                    break;
                }
                if let Some(entry) = segments[j].entry_place() {
                    if delivered.matches(entry, policy.proximity_km) == PlaceMatch::Continuous {
                        edges.push(Edge {
                            from: i,
                            to: j,
                            kind: EdgeKind::Location,
                        });
                    }
                }
            }
        }

        let mut adjacency = vec![Vec::new(); segments.len()];
        for e in &edges {
            adjacency[e.from].push((e.to, e.kind));
        }

        debug!(
            segments = segments.len(),
            edges = edges.len(),
            "dependency graph built"
        );

        Self { edges, adjacency }
    }

    /// All edges, chronology chain first.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of segment slots the graph was built over.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// True when the graph covers no segments.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Indices reachable from `start` along edges whose kind passes the
    /// filter, in ascending order. `start` itself is not included.
    pub fn reachable_from(&self, start: usize, follow: impl Fn(EdgeKind) -> bool) -> Vec<usize> {
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::from([start]);
        let mut out = Vec::new();

        while let Some(i) = queue.pop_front() {
            for &(j, kind) in &self.adjacency[i] {
                if follow(kind) && !visited[j] {
                    visited[j] = true;
                    out.push(j);
                    queue.push_back(j);
                }
            }
        }

        out.sort_unstable();
        out
    }
}
