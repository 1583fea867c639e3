//! Planner pipeline tests against an in-process fake of the geo services.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use motoplan::config::{ApiKeys, SamplingConfig};
use motoplan::models::weather::{Condition, MainReadings, Wind};
use motoplan::models::WeatherReport;
use motoplan::{
    Coordinate, GeoServices, InsightKind, Location, MotoPlanError, PlanStage, Route, RoutePlanner,
    RouteSummary, SavedRoute, Service,
};

/// One degree of longitude along the equator, in km
const KM_PER_DEGREE: f64 = 111.194_926_6;

#[derive(Default)]
struct FakeState {
    calls: Mutex<Vec<String>>,
    weather_points: Mutex<Vec<Coordinate>>,
    prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    unknown_places: HashSet<&'static str>,
    temperatures: Vec<f64>,
    weather_failure_at: Option<usize>,
}

#[derive(Clone)]
struct FakeServices {
    state: Arc<FakeState>,
}

impl FakeServices {
    fn new(state: FakeState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl GeoServices for FakeServices {
    async fn geocode(&self, query: &str) -> motoplan::Result<Option<Location>> {
        self.record(format!("geocode:{query}"));
        if self.state.unknown_places.contains(query) {
            return Ok(None);
        }
        Ok(Some(Location::new(0.0, 0.0, format!("{query}, Equator"))))
    }

    async fn route(
        &self,
        _start: &Location,
        _end: &Location,
        key: &str,
    ) -> motoplan::Result<Route> {
        self.record("route");
        assert_eq!(key, "ors-key");
        // 1.5 degrees of longitude along the equator, about 167 km
        Ok(Route::new(
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(1.5, 0.0),
            ],
            RouteSummary {
                distance: 1.5 * KM_PER_DEGREE * 1000.0,
                duration: 7200.0,
            },
        ))
    }

    async fn weather(&self, at: Coordinate, key: &str) -> motoplan::Result<WeatherReport> {
        assert_eq!(key, "owm-key");
        let index = {
            let mut points = self.state.weather_points.lock().unwrap();
            points.push(at);
            points.len() - 1
        };
        self.record("weather");

        let running = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.weather_failure_at == Some(index) {
            return Err(MotoPlanError::remote(Service::Weather, Some(429), "Too Many Requests"));
        }

        let temp = self.state.temperatures.get(index).copied().unwrap_or(20.0);
        Ok(WeatherReport {
            name: format!("Town {index}"),
            main: MainReadings { temp },
            weather: vec![Condition {
                main: "Clear".to_string(),
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
            }],
            wind: Wind { speed: 3.0 },
        })
    }

    async fn generate_insight(&self, prompt: &str, key: &str) -> motoplan::Result<String> {
        assert_eq!(key, "gemini-key");
        self.state.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Long straight desert roads. Carry water.".to_string())
    }
}

fn all_keys() -> ApiKeys {
    ApiKeys {
        routing: Some("ors-key".to_string()),
        weather: Some("owm-key".to_string()),
        insight: Some("gemini-key".to_string()),
    }
}

fn planner(services: &FakeServices, keys: ApiKeys) -> RoutePlanner<FakeServices> {
    RoutePlanner::new(services.clone(), keys, &SamplingConfig::default())
}

#[tokio::test]
async fn test_plan_runs_stages_in_order() {
    let services = FakeServices::new(FakeState::default());
    let mut planner = planner(&services, all_keys());

    let report = planner.plan("Quito", "Macapa").await.unwrap();

    // 0, 35, 70, 105, 140 km and the end at ~167 km
    assert_eq!(report.samples.len(), 6);
    let calls = services.calls();
    assert_eq!(&calls[..3], ["geocode:Quito", "geocode:Macapa", "route"]);
    assert_eq!(calls[3..].len(), 6);
    assert!(calls[3..].iter().all(|call| call == "weather"));

    // Strictly one weather lookup at a time, in route order
    assert_eq!(services.state.max_in_flight.load(Ordering::SeqCst), 1);
    let points = services.state.weather_points.lock().unwrap().clone();
    assert!(points.windows(2).all(|w| w[0].longitude < w[1].longitude));
    assert_eq!(points.first(), Some(&Coordinate::new(0.0, 0.0)));
    assert_eq!(points.last(), Some(&Coordinate::new(1.5, 0.0)));

    // Uniform weather: endpoints plus every third sample
    let shown: Vec<usize> = report.markers.iter().map(|m| m.sample_index).collect();
    assert_eq!(shown, vec![0, 3, 5]);

    let session = planner.session();
    assert_eq!(session.samples().len(), 6);
    assert_eq!(session.markers().len(), 3);
    let trip = planner.current_trip().unwrap();
    assert_eq!(trip.start, "Quito");
    assert_eq!(trip.end, "Macapa");
    assert_eq!(trip.summary.format_distance(), "166.8 km");
}

#[tokio::test]
async fn test_temperature_jump_adds_marker() {
    let services = FakeServices::new(FakeState {
        temperatures: vec![20.0, 24.0, 24.0, 24.0, 24.5, 25.0],
        ..FakeState::default()
    });
    let mut planner = planner(&services, all_keys());

    let report = planner.plan("Quito", "Macapa").await.unwrap();

    let shown: Vec<usize> = report.markers.iter().map(|m| m.sample_index).collect();
    assert_eq!(shown, vec![0, 1, 3, 5]);
    assert_eq!(report.markers[1].temperature, 24);
    assert_eq!(report.markers[1].title, "Town 1");
}

#[tokio::test]
async fn test_missing_keys_fail_before_any_request() {
    let services = FakeServices::new(FakeState::default());
    let keys = ApiKeys {
        weather: None,
        ..all_keys()
    };
    let mut planner = planner(&services, keys);

    let failure = planner.plan("Quito", "Macapa").await.unwrap_err();

    assert_eq!(failure.stage, PlanStage::Credentials);
    assert_eq!(failure.message(), "Please enter your API keys in settings.");
    assert!(failure.reveal_settings());
    assert!(services.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_destination_stops_before_routing() {
    let services = FakeServices::new(FakeState {
        unknown_places: HashSet::from(["Atlantis"]),
        ..FakeState::default()
    });
    let mut planner = planner(&services, all_keys());

    let failure = planner.plan("Quito", "Atlantis").await.unwrap_err();

    assert_eq!(failure.stage, PlanStage::GeocodeEnd);
    assert!(matches!(failure.error, MotoPlanError::NotFound { .. }));
    assert_eq!(failure.message(), "Could not find location: Atlantis");
    assert!(!failure.reveal_settings());
    assert_eq!(services.calls(), vec!["geocode:Quito", "geocode:Atlantis"]);
}

#[tokio::test]
async fn test_failed_plan_leaves_session_empty() {
    let services = FakeServices::new(FakeState {
        weather_failure_at: Some(8),
        ..FakeState::default()
    });
    let mut planner = planner(&services, all_keys());

    // First plan uses weather calls 0..=5 and succeeds
    planner.plan("Quito", "Macapa").await.unwrap();
    assert!(planner.session().current().is_some());

    // Second plan fails on its third weather lookup
    let failure = planner.plan("Quito", "Macapa").await.unwrap_err();
    assert_eq!(failure.stage, PlanStage::Weather { index: 2, of: 6 });
    assert_eq!(failure.message(), "Weather API Error: Too Many Requests");

    let session = planner.session();
    assert!(session.current().is_none());
    assert!(session.samples().is_empty());
    assert!(session.markers().is_empty());
    assert_eq!(session.last_failure(), Some("Weather API Error: Too Many Requests"));
    assert!(planner.current_trip().is_err());
}

#[tokio::test]
async fn test_insight_requires_key_and_plan() {
    let services = FakeServices::new(FakeState::default());

    let keys = ApiKeys {
        insight: None,
        ..all_keys()
    };
    let err = planner(&services, keys)
        .insight(InsightKind::Insight)
        .await
        .unwrap_err();
    assert!(matches!(err, MotoPlanError::Auth { .. }));
    assert_eq!(err.to_string(), "Enter Gemini Key in settings");

    let err = planner(&services, all_keys())
        .insight(InsightKind::Packing)
        .await
        .unwrap_err();
    assert!(matches!(err, MotoPlanError::Validation { .. }));
}

#[tokio::test]
async fn test_insight_prompts_describe_the_ride() {
    let services = FakeServices::new(FakeState::default());
    let mut planner = planner(&services, all_keys());
    planner.plan("Quito", "Macapa").await.unwrap();

    let text = planner.insight(InsightKind::Insight).await.unwrap();
    assert_eq!(text, "Long straight desert roads. Carry water.");
    planner.insight(InsightKind::Packing).await.unwrap();

    let prompts = services.state.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].starts_with("I am riding a motorcycle from Quito to Macapa."));
    assert!(
        prompts[0].contains(r#"{"location":"Town 0","temp":20.0,"condition":"Clear","wind":3.0}"#)
    );
    assert!(prompts[1].starts_with("Create a short bulleted motorcycle gear checklist"));
}

#[tokio::test]
async fn test_replay_plans_saved_endpoints() {
    let services = FakeServices::new(FakeState::default());
    let mut planner = planner(&services, all_keys());
    let saved = SavedRoute {
        id: "abc".to_string(),
        start: "Bogota".to_string(),
        end: "Lima".to_string(),
        summary: RouteSummary {
            distance: 1.0,
            duration: 1.0,
        },
        created_at: Utc::now(),
    };

    let report = planner.replay(&saved).await.unwrap();

    assert_eq!(report.start_query, "Bogota");
    assert_eq!(report.end_query, "Lima");
    assert_eq!(&services.calls()[..2], ["geocode:Bogota", "geocode:Lima"]);
}
