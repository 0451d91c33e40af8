//! Location endpoints and the proximity test between them.
//!
//! Every segment pins the traveler to one or two places. Places are
//! loosely specified (a display name at minimum, optionally an IATA-like
//! code, coordinates, and a city/country pair) so the continuity test
//! works with whatever resolution the caller supplied and reports
//! `Indeterminate` rather than guessing when nothing overlaps.

use std::fmt;

use serde::{Serialize, Serializer};

/// Error returned when parsing an invalid location code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location code: {reason}")]
pub struct InvalidLocationCode {
    reason: &'static str,
}

/// A 3-letter IATA-like location code (airport, station, or port).
///
/// Codes are always 3 uppercase ASCII letters, guaranteed by construction.
///
/// # Examples
///
/// ```
/// use itinerary_engine::domain::LocationCode;
///
/// let cdg = LocationCode::parse("CDG").unwrap();
/// assert_eq!(cdg.as_str(), "CDG");
///
/// // Lowercase is rejected by the strict parser...
/// assert!(LocationCode::parse("cdg").is_err());
/// // ...but accepted by the normalizing one
/// assert_eq!(LocationCode::parse_normalized(" cdg ").unwrap(), cdg);
///
/// // Wrong length is rejected
/// assert!(LocationCode::parse("CD").is_err());
/// assert!(LocationCode::parse("CDGX").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationCode([u8; 3]);

impl LocationCode {
    /// Parse a location code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidLocationCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidLocationCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidLocationCode {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(LocationCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Parse a location code, trimming whitespace and upper-casing first.
    ///
    /// Use this at input boundaries where user-typed codes arrive.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidLocationCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: we only store valid ASCII uppercase letters
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationCode({})", self.as_str())
    }
}

impl Serialize for LocationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for out-of-range coordinates.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates: {reason}")]
pub struct InvalidCoordinates {
    reason: &'static str,
}

/// Earth radius in kilometers, for great-circle distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees, validated to be on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    lat: f64,
    lon: f64,
}

impl LatLon {
    /// Create coordinates, rejecting values off the globe.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinates> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinates {
                reason: "latitude must be within -90..=90",
            });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidCoordinates {
                reason: "longitude must be within -180..=180",
            });
        }
        Ok(Self { lat, lon })
    }

    /// Returns the latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns the longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle (haversine) distance to another point, in kilometers.
    pub fn distance_km(&self, other: &LatLon) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

/// Result of comparing two places for geographic continuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceMatch {
    /// The places resolve to the same locality.
    Continuous,
    /// The places are demonstrably apart.
    Discontinuous,
    /// Not enough shared detail to decide either way.
    Indeterminate,
}

/// A location endpoint on a segment.
///
/// Only the display name is mandatory. The richer the optional fields, the
/// sharper the continuity test; with nothing but dissimilar names the
/// comparison stays [`PlaceMatch::Indeterminate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    /// Display name ("Charles de Gaulle Airport", "Hotel Lutetia").
    pub name: String,
    /// IATA-like code, when the place is a coded port/station.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<LocationCode>,
    /// Coordinates, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<LatLon>,
    /// City the place belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Country the place belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Place {
    /// Create a place with just a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: None,
            coords: None,
            city: None,
            country: None,
        }
    }

    /// Attach a location code.
    pub fn with_code(mut self, code: LocationCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach coordinates.
    pub fn with_coords(mut self, coords: LatLon) -> Self {
        self.coords = Some(coords);
        self
    }

    /// Attach a city name.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Attach a country name.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Compare two places for geographic continuity.
    ///
    /// Checks, in order: equal codes, equal display names, matching
    /// city/country, then coordinate distance against `threshold_km`.
    /// Each check only fires when both sides carry the relevant field, so
    /// the comparison is symmetric; when no field overlaps the result is
    /// [`PlaceMatch::Indeterminate`].
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_engine::domain::{Place, PlaceMatch};
    ///
    /// let a = Place::named("CDG").with_city("Paris");
    /// let b = Place::named("Hotel Lutetia").with_city("Paris");
    /// assert_eq!(a.matches(&b, 50.0), PlaceMatch::Continuous);
    ///
    /// let c = Place::named("FCO").with_city("Rome");
    /// assert_eq!(a.matches(&c, 50.0), PlaceMatch::Discontinuous);
    ///
    /// let d = Place::named("somewhere else entirely");
    /// assert_eq!(a.matches(&d, 50.0), PlaceMatch::Indeterminate);
    /// ```
    pub fn matches(&self, other: &Place, threshold_km: f64) -> PlaceMatch {
        if let (Some(a), Some(b)) = (self.code, other.code) {
            if a == b {
                return PlaceMatch::Continuous;
            }
        }

        if eq_ignore_case(&self.name, &other.name) {
            return PlaceMatch::Continuous;
        }

        if let (Some(a), Some(b)) = (&self.city, &other.city) {
            if eq_ignore_case(a, b) {
                // Same city name in two different countries is a different city
                if let (Some(ca), Some(cb)) = (&self.country, &other.country) {
                    if !eq_ignore_case(ca, cb) {
                        return PlaceMatch::Discontinuous;
                    }
                }
                return PlaceMatch::Continuous;
            }
            // Distinct city names are decisive only when coordinates can't
            // overrule them (adjacent suburbs may still be within range)
            if self.coords.is_none() || other.coords.is_none() {
                return PlaceMatch::Discontinuous;
            }
        }

        if let (Some(a), Some(b)) = (&self.coords, &other.coords) {
            return if a.distance_km(b) <= threshold_km {
                PlaceMatch::Continuous
            } else {
                PlaceMatch::Discontinuous
            };
        }

        if self.code.is_some() && other.code.is_some() {
            // Both coded, codes differ, nothing else matched
            return PlaceMatch::Discontinuous;
        }

        PlaceMatch::Indeterminate
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.city) {
            (Some(code), _) => write!(f, "{} ({})", self.name, code),
            (None, Some(city)) if !eq_ignore_case(city, &self.name) => {
                write!(f, "{}, {}", self.name, city)
            }
            _ => f.write_str(&self.name),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
