//! Driving directions via OpenRouteService

use serde::Deserialize;
use tracing::{info, instrument};

use super::{GeoApiClient, ensure_success, read_json, send};
use crate::Result;
use crate::error::{MotoPlanError, Service};
use crate::models::{Coordinate, Location, Route, RouteSummary};

/// The `driving-car` profile suits motorcycle touring better than `driving-hgv`
const PROFILE: &str = "driving-car";

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<Coordinate>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

impl DirectionsResponse {
    fn into_route(self) -> Result<Route> {
        let feature = self.features.into_iter().next().ok_or_else(|| {
            MotoPlanError::remote(Service::Routing, None, "No route found between these locations")
        })?;
        let segment = feature.properties.segments.into_iter().next().ok_or_else(|| {
            MotoPlanError::remote(Service::Routing, None, "Route response has no segments")
        })?;
        if feature.geometry.coordinates.is_empty() {
            return Err(MotoPlanError::remote(
                Service::Routing,
                None,
                "Route response has no geometry",
            ));
        }

        Ok(Route::new(
            feature.geometry.coordinates,
            RouteSummary {
                distance: segment.distance,
                duration: segment.duration,
            },
        ))
    }
}

impl GeoApiClient {
    /// Fetch the driving route between two geocoded locations
    #[instrument(skip(self, start, end, key), fields(start = %start.name, end = %end.name))]
    pub async fn directions(&self, start: &Location, end: &Location, key: &str) -> Result<Route> {
        let url = format!(
            "{}/v2/directions/{}?api_key={}&start={},{}&end={},{}",
            self.services.routing_url.trim_end_matches('/'),
            PROFILE,
            urlencoding::encode(key),
            start.longitude,
            start.latitude,
            end.longitude,
            end.latitude
        );

        let response = send(Service::Routing, self.client.get(&url)).await?;
        let response =
            ensure_success(Service::Routing, response, |_| "Check API Key".to_string()).await?;
        let directions: DirectionsResponse = read_json(Service::Routing, response).await?;
        let route = directions.into_route()?;

        info!(
            "Route has {} points, {}",
            route.coordinates.len(),
            route.summary
        );
        Ok(route)
    }
}
