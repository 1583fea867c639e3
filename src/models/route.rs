//! Driving route model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Distance and duration of a planned route
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    /// Distance in meters
    pub distance: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl RouteSummary {
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration / 3600.0
    }

    /// Format distance with unit
    #[must_use]
    pub fn format_distance(&self) -> String {
        format!("{:.1} km", self.distance_km())
    }

    /// Format duration with unit
    #[must_use]
    pub fn format_duration(&self) -> String {
        format!("{:.1} hrs", self.duration_hours())
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.format_distance(), self.format_duration())
    }
}

/// A driving route between two locations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Route {
    /// Ordered route geometry
    pub coordinates: Vec<Coordinate>,
    pub summary: RouteSummary,
}

impl Route {
    #[must_use]
    pub fn new(coordinates: Vec<Coordinate>, summary: RouteSummary) -> Self {
        Self {
            coordinates,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_formatting() {
        let summary = RouteSummary {
            distance: 123_456.0,
            duration: 5_400.0,
        };
        assert_eq!(summary.format_distance(), "123.5 km");
        assert_eq!(summary.format_duration(), "1.5 hrs");
        assert_eq!(summary.to_string(), "123.5 km / 1.5 hrs");
    }
}
