//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// A geocoded place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Display name returned by the geocoder
    pub name: String,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: name.into(),
        }
    }

    /// Position of this location as a route coordinate
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A route vertex in `(longitude, latitude)` order, as routing services return them
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance to another coordinate in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Point at `fraction` of the straight segment from `self` to `other`
    #[must_use]
    pub fn lerp(&self, other: &Coordinate, fraction: f64) -> Coordinate {
        Coordinate::new(
            self.longitude + (other.longitude - self.longitude) * fraction,
            self.latitude + (other.latitude - self.latitude) * fraction,
        )
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.longitude, coordinate.latitude]
    }
}
