//! `MotoPlan` - Motorcycle route planning with weather along the way
//!
//! This library resolves place names, fetches a driving route, samples it at
//! regular intervals, looks up the weather at each sample and decides which
//! samples deserve a map marker. Planned trips can be saved per user and
//! summarized by a generative model.

pub mod api;
pub mod config;
pub mod error;
pub mod marker;
pub mod models;
pub mod planner;
pub mod sampler;
pub mod store;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use api::{GeoApiClient, GeoServices};
pub use config::MotoPlanConfig;
pub use error::{MotoPlanError, Service};
pub use marker::{Marker, MarkerFilter};
pub use models::{
    Coordinate, Location, NewSavedRoute, Route, RouteSummary, SavedRoute, WeatherSample,
};
pub use planner::{InsightKind, PlanFailure, PlanReport, PlanStage, RoutePlanner, Session};
pub use store::{FjallRouteStore, Identity, RouteStore, Subscription, subscribe};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, MotoPlanError>;
