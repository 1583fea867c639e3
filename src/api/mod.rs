//! HTTP clients for the geocoding, routing, weather and insight services
//!
//! Every operation is a single request with no retry. Non-success responses are
//! turned into [`MotoPlanError::Remote`] carrying the service's own message.

mod geocoding;
mod insight;
mod routing;
mod weather;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::Result;
use crate::config::ServicesConfig;
use crate::error::{MotoPlanError, Service};
use crate::models::{Coordinate, Location, Route, WeatherReport};

/// The remote operations a route plan is built from
#[async_trait]
pub trait GeoServices: Send + Sync {
    /// Resolve a place name; `None` when the geocoder has no candidate
    async fn geocode(&self, query: &str) -> Result<Option<Location>>;

    /// Driving route between two locations
    async fn route(&self, start: &Location, end: &Location, key: &str) -> Result<Route>;

    /// Current conditions at a coordinate
    async fn weather(&self, at: Coordinate, key: &str) -> Result<WeatherReport>;

    /// Generated text for a prompt
    async fn generate_insight(&self, prompt: &str, key: &str) -> Result<String>;
}

/// Client for all external services used by the planner
#[derive(Debug, Clone)]
pub struct GeoApiClient {
    client: Client,
    services: ServicesConfig,
}

impl GeoApiClient {
    /// Create a new client from the service configuration
    pub fn new(services: &ServicesConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(services.timeout_seconds.into()))
            .user_agent(services.user_agent.as_str())
            .build()
            .map_err(|e| MotoPlanError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            services: services.clone(),
        })
    }
}

#[async_trait]
impl GeoServices for GeoApiClient {
    async fn geocode(&self, query: &str) -> Result<Option<Location>> {
        self.search(query).await
    }

    async fn route(&self, start: &Location, end: &Location, key: &str) -> Result<Route> {
        self.directions(start, end, key).await
    }

    async fn weather(&self, at: Coordinate, key: &str) -> Result<WeatherReport> {
        self.current_weather(at, key).await
    }

    async fn generate_insight(&self, prompt: &str, key: &str) -> Result<String> {
        self.generate_content(prompt, key).await
    }
}

/// Send a request, mapping connection failures to transport errors
async fn send(service: Service, request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        warn!("{} request could not be sent: {}", service, e);
        MotoPlanError::transport(service, e.to_string())
    })
}

/// Pass successful responses through; turn anything else into a remote error.
///
/// `fallback` supplies the message when the body does not carry one.
async fn ensure_success(
    service: Service,
    response: Response,
    fallback: impl FnOnce(StatusCode) -> String,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        debug!("{} responded with {}", service, status);
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = remote_message(&body).unwrap_or_else(|| fallback(status));
    warn!("{} failed with HTTP {}: {}", service, status, message);

    Err(MotoPlanError::remote(
        service,
        Some(status.as_u16()),
        message,
    ))
}

/// Decode a JSON body
async fn read_json<T: DeserializeOwned>(service: Service, response: Response) -> Result<T> {
    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {} response: {}", service, e);
        MotoPlanError::transport(service, format!("unexpected response body: {e}"))
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorField>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detailed { message: String },
    Text(String),
}

/// Pull the human-readable message out of a service error body.
///
/// Understands `{"error":{"message":..}}`, `{"error":".."}` and `{"message":..}`.
fn remote_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = match parsed.error {
        Some(ErrorField::Detailed { message }) | Some(ErrorField::Text(message)) => Some(message),
        None => parsed.message,
    };
    message.filter(|m| !m.trim().is_empty())
}
