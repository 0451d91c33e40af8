//! Identifier types for itineraries, segments, and travelers.
//!
//! Itinerary and segment ids are UUIDs wrapped in newtypes so the two can
//! never be confused at a call site. Traveler references are opaque
//! caller-supplied handles (a name or an external id).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when parsing an invalid id string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid id: {reason}")]
pub struct InvalidId {
    reason: &'static str,
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its canonical hyphenated form.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                Uuid::parse_str(s).map(Self).map_err(|_| InvalidId {
                    reason: "expected a UUID in canonical form",
                })
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id! {
    /// Identity of an itinerary aggregate.
    ItineraryId
}

uuid_id! {
    /// Identity of a single segment within an itinerary.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_engine::domain::SegmentId;
    ///
    /// let id = SegmentId::new();
    /// let parsed = SegmentId::parse(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    ///
    /// // Garbage is rejected
    /// assert!(SegmentId::parse("not-a-uuid").is_err());
    /// ```
    SegmentId
}

/// A reference to a traveler attached to a segment.
///
/// The engine does not manage a traveler registry; this is an opaque
/// non-empty handle supplied by the caller (a display name or an id from an
/// external system). Deserialization goes through [`TravelerRef::new`] at
/// the payload boundary so emptiness is always rejected.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TravelerRef(String);

impl TravelerRef {
    /// Create a traveler reference from a string.
    ///
    /// Returns an error if the string is empty or whitespace-only.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidId> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(InvalidId {
                reason: "traveler reference cannot be empty",
            });
        }
        Ok(TravelerRef(s))
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TravelerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TravelerRef({})", self.0)
    }
}

impl fmt::Display for TravelerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any non-blank string is a valid traveler reference
        #[test]
        fn nonblank_traveler_valid(s in "\\S.*") {
            prop_assert!(TravelerRef::new(s).is_ok());
        }

        /// Traveler references roundtrip through as_str
        #[test]
        fn traveler_roundtrip(s in "\\S[\\S ]*") {
            let t = TravelerRef::new(s.clone()).unwrap();
            prop_assert_eq!(t.as_str(), s.as_str());
        }

        /// Segment ids roundtrip through their display form
        #[test]
        fn segment_id_display_roundtrip(bytes in any::<[u8; 16]>()) {
            let id = SegmentId::parse(&Uuid::from_bytes(bytes).to_string()).unwrap();
            prop_assert_eq!(SegmentId::parse(&id.to_string()).unwrap(), id);
        }
    }
}
