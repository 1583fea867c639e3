//! Persisted trip summaries

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RouteSummary;

/// A trip that has been planned but not yet stored
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewSavedRoute {
    pub start: String,
    pub end: String,
    pub summary: RouteSummary,
}

/// A trip stored in a user's collection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavedRoute {
    /// Opaque record identifier
    pub id: String,
    pub start: String,
    pub end: String,
    pub summary: RouteSummary,
    pub created_at: DateTime<Utc>,
}

impl SavedRoute {
    /// Assign an id and creation time to a new trip
    #[must_use]
    pub fn create(route: NewSavedRoute) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            start: route.start,
            end: route.end,
            summary: route.summary,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for SavedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ➝ {} ({:.0}km)",
            self.start,
            self.end,
            self.summary.distance_km()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_unique_ids() {
        let trip = NewSavedRoute {
            start: "Los Angeles".to_string(),
            end: "Las Vegas".to_string(),
            summary: RouteSummary {
                distance: 434_600.0,
                duration: 14_400.0,
            },
        };
        let a = SavedRoute::create(trip.clone());
        let b = SavedRoute::create(trip);
        assert_ne!(a.id, b.id);
        assert_eq!(a.to_string(), "Los Angeles ➝ Las Vegas (435km)");
    }
}
