//! Data models for the MotoPlan application
//!
//! This module contains the core domain models organized by concern:
//! - Location: geocoded places and route coordinates
//! - Route: driving route geometry and its distance/duration summary
//! - Weather: raw weather reports and the samples taken along a route
//! - Saved route: persisted trip summaries

pub mod location;
pub mod route;
pub mod saved_route;
pub mod weather;

// Re-export all public types for convenient access
pub use location::{Coordinate, Location};
pub use route::{Route, RouteSummary};
pub use saved_route::{NewSavedRoute, SavedRoute};
pub use weather::{WeatherReport, WeatherSample};
