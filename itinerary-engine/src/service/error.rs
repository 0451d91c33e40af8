//! The operation error taxonomy and its status mapping.

use thiserror::Error;

use crate::domain::{DomainError, InvalidCoordinates, InvalidId, InvalidLocationCode};
use crate::schedule::{MoveError, ReorderError};
use crate::store::StoreError;

/// Failure of a service operation.
///
/// Every fallible operation funnels into these four categories so a
/// transport layer can map them to a status without inspecting the
/// underlying module errors. Conflicts cover both scheduling collisions
/// (a cascade landing on a stationary segment) and stale writes caught
/// by the store's version check.
#[derive(Debug, PartialEq, Error)]
pub enum OperationError {
    /// The itinerary or segment the request names does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The request is malformed or names an impossible change.
    #[error("{0}")]
    Validation(String),
    /// The request is well formed but clashes with current state.
    #[error("{0}")]
    Conflict(String),
    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(StoreError),
}

impl OperationError {
    /// HTTP status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            OperationError::NotFound(_) => 404,
            OperationError::Validation(_) | OperationError::Conflict(_) => 400,
            OperationError::Store(_) => 500,
        }
    }
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => OperationError::NotFound(err.to_string()),
            StoreError::StaleWrite { .. } => OperationError::Conflict(err.to_string()),
            StoreError::ReadFailed(_) | StoreError::WriteFailed(_) => OperationError::Store(err),
        }
    }
}

impl From<DomainError> for OperationError {
    fn from(err: DomainError) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<InvalidId> for OperationError {
    fn from(err: InvalidId) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<InvalidLocationCode> for OperationError {
    fn from(err: InvalidLocationCode) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<InvalidCoordinates> for OperationError {
    fn from(err: InvalidCoordinates) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<ReorderError> for OperationError {
    fn from(err: ReorderError) -> Self {
        OperationError::Validation(err.to_string())
    }
}

impl From<MoveError> for OperationError {
    fn from(err: MoveError) -> Self {
        match &err {
            MoveError::UnknownSegment(_) => OperationError::NotFound(err.to_string()),
            MoveError::Domain(_) => OperationError::Validation(err.to_string()),
            MoveError::Conflict { conflicts } => {
                let detail: Vec<&str> = conflicts.iter().map(|i| i.message.as_str()).collect();
                OperationError::Conflict(format!("{err}: {}", detail.join("; ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItineraryId, SegmentId};
    use crate::schedule::{Issue, IssueKind, Severity};

    #[test]
    fn status_codes() {
        assert_eq!(OperationError::NotFound("x".into()).status_code(), 404);
        assert_eq!(OperationError::Validation("x".into()).status_code(), 400);
        assert_eq!(OperationError::Conflict("x".into()).status_code(), 400);
        assert_eq!(
            OperationError::Store(StoreError::WriteFailed("x".into())).status_code(),
            500
        );
    }

    #[test]
    fn store_errors_map_by_kind() {
        let id = ItineraryId::new();
        assert!(matches!(
            OperationError::from(StoreError::NotFound(id)),
            OperationError::NotFound(_)
        ));
        assert!(matches!(
            OperationError::from(StoreError::StaleWrite {
                expected: 1,
                actual: 2
            }),
            OperationError::Conflict(_)
        ));
        assert!(matches!(
            OperationError::from(StoreError::ReadFailed("poisoned".into())),
            OperationError::Store(_)
        ));
    }

    #[test]
    fn move_conflict_carries_the_collision_detail() {
        let a = SegmentId::new();
        let b = SegmentId::new();
        let err = MoveError::Conflict {
            conflicts: vec![Issue {
                kind: IssueKind::Overlap,
                severity: Severity::Error,
                segment_ids: vec![a, b],
                message: "flight would overlap hotel".into(),
            }],
        };

        let op = OperationError::from(err);
        assert_eq!(op.status_code(), 400);
        assert!(op.to_string().contains("flight would overlap hotel"));
    }

    #[test]
    fn unknown_segment_in_a_move_is_not_found() {
        let err = MoveError::UnknownSegment(SegmentId::new());
        assert_eq!(OperationError::from(err).status_code(), 404);
    }
}
