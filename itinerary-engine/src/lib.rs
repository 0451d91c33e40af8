//! Itinerary scheduling and consistency engine.
//!
//! Keeps a traveler's itinerary temporally and geographically coherent
//! while it is built, imported, and edited: validates continuity between
//! segments, fills timeline and geography gaps with inferred segments,
//! and cascades one segment's time change through the segments that
//! depend on it.

pub mod domain;
pub mod schedule;
pub mod service;
pub mod store;
