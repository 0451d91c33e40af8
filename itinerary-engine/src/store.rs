//! Itinerary persistence.
//!
//! The engine computes over one in-memory itinerary at a time; storage is
//! a collaborator behind the [`ItineraryStore`] trait. A save replaces the
//! whole aggregate atomically and carries an optimistic version check, so
//! a stale writer fails loudly instead of overwriting someone else's
//! update. [`MemoryStore`] is the in-process implementation used by the
//! service and its tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Itinerary, ItineraryId, ItinerarySummary};

/// Storage failures, propagated untouched to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("itinerary {0} not found")]
    NotFound(ItineraryId),

    /// The aggregate changed since the caller loaded it.
    #[error("stale write: expected version {expected}, store holds {actual}")]
    StaleWrite { expected: u64, actual: u64 },

    #[error("store read failed: {0}")]
    ReadFailed(String),

    #[error("store write failed: {0}")]
    WriteFailed(String),
}

/// Persistence collaborator for itinerary aggregates.
///
/// `save` must replace the previous state atomically; a partial write is
/// never acceptable. Implementations bump the version and `updated_at`
/// on every successful save and reject a save whose version no longer
/// matches the stored one.
pub trait ItineraryStore: Send + Sync {
    /// Load an aggregate by id.
    fn get(&self, id: ItineraryId) -> Result<Itinerary, StoreError>;

    /// Listing rows for every stored itinerary, ordered by start date.
    fn list(&self) -> Result<Vec<ItinerarySummary>, StoreError>;

    /// Persist an aggregate, returning it with its new version.
    ///
    /// An id the store has not seen creates the itinerary. An id it has
    /// seen requires `itinerary.version` to match the stored version.
    fn save(&self, itinerary: Itinerary) -> Result<Itinerary, StoreError>;

    /// Remove an aggregate.
    fn delete(&self, id: ItineraryId) -> Result<(), StoreError>;
}

/// In-memory store keyed by itinerary id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<ItineraryId, Itinerary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItineraryStore for MemoryStore {
    fn get(&self, id: ItineraryId) -> Result<Itinerary, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        items.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    fn list(&self) -> Result<Vec<ItinerarySummary>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        let mut summaries: Vec<ItinerarySummary> = items.values().map(Itinerary::summary).collect();
        summaries.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(summaries)
    }

    fn save(&self, mut itinerary: Itinerary) -> Result<Itinerary, StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if let Some(existing) = items.get(&itinerary.id) {
            if existing.version != itinerary.version {
                return Err(StoreError::StaleWrite {
                    expected: itinerary.version,
                    actual: existing.version,
                });
            }
        }

        itinerary.version += 1;
        itinerary.updated_at = Utc::now();
        items.insert(itinerary.id, itinerary.clone());

        debug!(id = %itinerary.id, version = itinerary.version, "itinerary saved");
        Ok(itinerary)
    }

    fn delete(&self, id: ItineraryId) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        items
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
