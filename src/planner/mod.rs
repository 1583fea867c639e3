//! Route planning orchestration
//!
//! A plan runs strictly in sequence: credentials, geocode both ends, fetch the
//! route, sample it, then query the weather at each sample one at a time.

mod insight;
mod session;

pub use insight::{InsightKind, build_prompt};
pub use session::Session;

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::api::GeoServices;
use crate::config::{ApiKeys, SamplingConfig};
use crate::error::MotoPlanError;
use crate::marker::{Marker, MarkerFilter};
use crate::models::{Location, NewSavedRoute, Route, SavedRoute, WeatherSample};
use crate::sampler::{route_length_km, sample_route};
use crate::store::RouteStore;

const MISSING_KEYS: &str = "Please enter your API keys in settings.";
const MISSING_INSIGHT_KEY: &str = "Enter Gemini Key in settings";

/// Pipeline stage a plan failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStage {
    Credentials,
    GeocodeStart,
    GeocodeEnd,
    FetchRoute,
    /// Weather lookup for the sample at `index`
    Weather { index: usize, of: usize },
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStage::Credentials => write!(f, "checking API keys"),
            PlanStage::GeocodeStart => write!(f, "finding the start"),
            PlanStage::GeocodeEnd => write!(f, "finding the destination"),
            PlanStage::FetchRoute => write!(f, "fetching the route"),
            PlanStage::Weather { index, of } => {
                write!(f, "fetching weather for sample {} of {}", index + 1, of)
            }
        }
    }
}

/// A plan that stopped at `stage`
#[derive(Debug)]
pub struct PlanFailure {
    pub stage: PlanStage,
    pub error: MotoPlanError,
}

impl PlanFailure {
    fn at(stage: PlanStage) -> impl FnOnce(MotoPlanError) -> Self {
        move |error| Self { stage, error }
    }

    /// Message to show the rider
    #[must_use]
    pub fn message(&self) -> String {
        self.error.user_message()
    }

    /// Whether the settings (API keys) should be brought to the user's attention
    #[must_use]
    pub fn reveal_settings(&self) -> bool {
        self.error.is_credential_problem()
    }
}

impl fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed while {}: {}", self.stage, self.message())
    }
}

impl std::error::Error for PlanFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Everything a successful plan produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    /// Start as typed by the rider
    pub start_query: String,
    /// Destination as typed by the rider
    pub end_query: String,
    pub start: Location,
    pub end: Location,
    pub route: Route,
    pub samples: Vec<WeatherSample>,
    pub markers: Vec<Marker>,
}

impl PlanReport {
    /// The record that saving this plan would create
    #[must_use]
    pub fn trip(&self) -> NewSavedRoute {
        NewSavedRoute {
            start: self.start_query.clone(),
            end: self.end_query.clone(),
            summary: self.route.summary,
        }
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🏍️  {} ➝ {}", self.start_query, self.end_query)?;
        writeln!(
            f,
            "   📏 {}   ⏱️  {}",
            self.route.summary.format_distance(),
            self.route.summary.format_duration()
        )?;
        writeln!(
            f,
            "   🌤️  {} weather samples, {} shown",
            self.samples.len(),
            self.markers.len()
        )?;
        for marker in &self.markers {
            let temperature = match self.samples.get(marker.sample_index) {
                Some(sample) => sample.format_temperature(),
                None => format!("{}°C", marker.temperature),
            };
            writeln!(
                f,
                "   📍 {}: {} {}",
                marker.title, temperature, marker.description
            )?;
        }
        Ok(())
    }
}

/// Plans motorcycle trips and keeps the current one in a [`Session`]
pub struct RoutePlanner<S> {
    services: S,
    keys: ApiKeys,
    step_km: f64,
    filter: MarkerFilter,
    session: Session,
}

impl<S: GeoServices> RoutePlanner<S> {
    pub fn new(services: S, keys: ApiKeys, sampling: &SamplingConfig) -> Self {
        Self {
            services,
            keys,
            step_km: sampling.step_km,
            filter: MarkerFilter::from(sampling),
            session: Session::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Plan a trip from `start` to `end`.
    ///
    /// The previous plan is cleared first, so after a failure the session is
    /// empty.
    #[instrument(skip(self))]
    pub async fn plan(
        &mut self,
        start: &str,
        end: &str,
    ) -> std::result::Result<PlanReport, PlanFailure> {
        info!("Planning ride from {} to {}", start, end);
        self.session.begin();

        let outcome = self.run(start, end).await;
        match &outcome {
            Ok(report) => info!(
                "Planned {} with {} samples and {} markers",
                report.route.summary,
                report.samples.len(),
                report.markers.len()
            ),
            Err(failure) => warn!("{}", failure),
        }

        self.session.finish(&outcome);
        outcome
    }

    /// Plan a previously saved trip again
    pub async fn replay(
        &mut self,
        saved: &SavedRoute,
    ) -> std::result::Result<PlanReport, PlanFailure> {
        debug!("Re-planning saved route {}", saved.id);
        self.plan(&saved.start, &saved.end).await
    }

    /// The trip to save for the current plan
    pub fn current_trip(&self) -> Result<NewSavedRoute> {
        self.session
            .trip()
            .ok_or_else(|| MotoPlanError::validation("Plan a route before saving it"))
    }

    /// Save the current trip to `store`
    pub async fn save_current(&self, store: &dyn RouteStore) -> Result<SavedRoute> {
        let trip = self.current_trip()?;
        store.save(trip).await
    }

    /// Ask the generative model about the current plan
    #[instrument(skip(self))]
    pub async fn insight(&self, kind: InsightKind) -> Result<String> {
        let key = present(&self.keys.insight)
            .ok_or_else(|| MotoPlanError::auth(MISSING_INSIGHT_KEY))?;
        let trip = self.session.trip().ok_or_else(|| {
            MotoPlanError::validation("Plan a route before asking for a ride summary")
        })?;

        let prompt = build_prompt(kind, &trip, self.session.samples());
        debug!("Requesting {} for {} samples", kind, self.session.samples().len());
        self.services.generate_insight(&prompt, key).await
    }

    async fn run(
        &self,
        start_query: &str,
        end_query: &str,
    ) -> std::result::Result<PlanReport, PlanFailure> {
        let (routing_key, weather_key) = self
            .planning_keys()
            .map_err(PlanFailure::at(PlanStage::Credentials))?;

        let start = self
            .resolve(start_query)
            .await
            .map_err(PlanFailure::at(PlanStage::GeocodeStart))?;
        let end = self
            .resolve(end_query)
            .await
            .map_err(PlanFailure::at(PlanStage::GeocodeEnd))?;
        debug!(
            "Resolved {} to ({}) and {} to ({})",
            start_query,
            start.format_coordinates(),
            end_query,
            end.format_coordinates()
        );

        let route = self
            .services
            .route(&start, &end, routing_key)
            .await
            .map_err(PlanFailure::at(PlanStage::FetchRoute))?;

        let points = sample_route(&route.coordinates, self.step_km);
        info!(
            "Sampling {} points every {}km along {:.1}km of route",
            points.len(),
            self.step_km,
            route_length_km(&route.coordinates)
        );

        let count = points.len();
        let mut samples: Vec<WeatherSample> = Vec::with_capacity(count);
        for (index, point) in points.into_iter().enumerate() {
            let report = self
                .services
                .weather(point, weather_key)
                .await
                .map_err(PlanFailure::at(PlanStage::Weather { index, of: count }))?;
            samples.push(WeatherSample::from_report(report, point));
        }
        let markers = self.filter.select(&samples);

        Ok(PlanReport {
            start_query: start_query.to_string(),
            end_query: end_query.to_string(),
            start,
            end,
            route,
            samples,
            markers,
        })
    }

    fn planning_keys(&self) -> Result<(&str, &str)> {
        match (present(&self.keys.routing), present(&self.keys.weather)) {
            (Some(routing), Some(weather)) => Ok((routing, weather)),
            _ => Err(MotoPlanError::auth(MISSING_KEYS)),
        }
    }

    async fn resolve(&self, query: &str) -> Result<Location> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MotoPlanError::validation("Enter both a start and a destination"));
        }
        self.services
            .geocode(query)
            .await?
            .ok_or_else(|| MotoPlanError::not_found(query))
    }
}

fn present(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}
