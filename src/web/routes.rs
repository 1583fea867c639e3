use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures::Stream;
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::AppState;
use crate::api::GeoServices;
use crate::error::MotoPlanError;
use crate::models::SavedRoute;
use crate::planner::{InsightKind, PlanFailure, PlanReport, PlanStage};

pub(super) fn router<S: GeoServices + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/plan", post(plan_route::<S>).get(current_plan::<S>))
        .route("/insight", post(insight::<S>))
        .route("/routes", get(list_routes::<S>).post(save_route::<S>))
        .route("/routes/{id}", delete(delete_route::<S>))
        .route("/routes/events", get(route_events::<S>))
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct InsightRequest {
    kind: InsightKind,
}

#[derive(Debug, Serialize)]
struct InsightResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<PlanStage>,
    reveal_settings: bool,
}

/// Error response carrying the body the UI expects
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn busy() -> Self {
        Self {
            status: StatusCode::CONFLICT,
            body: ErrorBody {
                error: "A route is already being planned".to_string(),
                stage: None,
                reveal_settings: false,
            },
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: message.into(),
                stage: None,
                reveal_settings: false,
            },
        }
    }
}

fn status_for(error: &MotoPlanError) -> StatusCode {
    match error {
        MotoPlanError::NotFound { .. } | MotoPlanError::UnknownRoute { .. } => {
            StatusCode::NOT_FOUND
        }
        MotoPlanError::Auth { .. } => StatusCode::UNAUTHORIZED,
        MotoPlanError::Validation { .. } => StatusCode::BAD_REQUEST,
        MotoPlanError::Remote { .. } | MotoPlanError::Transport { .. } => StatusCode::BAD_GATEWAY,
        MotoPlanError::Config { .. } | MotoPlanError::Store { .. } | MotoPlanError::Io { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<MotoPlanError> for ApiError {
    fn from(error: MotoPlanError) -> Self {
        Self {
            status: status_for(&error),
            body: ErrorBody {
                error: error.user_message(),
                stage: None,
                reveal_settings: error.is_credential_problem(),
            },
        }
    }
}

impl From<PlanFailure> for ApiError {
    fn from(failure: PlanFailure) -> Self {
        Self {
            status: status_for(&failure.error),
            body: ErrorBody {
                error: failure.message(),
                stage: Some(failure.stage),
                reveal_settings: failure.reveal_settings(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Plan in a task of its own holding the planner lock, so a client that
/// disconnects does not cancel the run halfway.
async fn plan_route<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanReport>, ApiError> {
    let mut planner = state
        .planner
        .clone()
        .try_lock_owned()
        .map_err(|_| ApiError::busy())?;

    let outcome = tokio::spawn(async move { planner.plan(&request.start, &request.end).await })
        .await
        .map_err(|e| {
            error!("Planning task failed: {}", e);
            ApiError::internal("Planning was interrupted")
        })?;

    Ok(Json(outcome?))
}

async fn current_plan<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<PlanReport>, ApiError> {
    let planner = state.planner.try_lock().map_err(|_| ApiError::busy())?;
    planner
        .session()
        .current()
        .cloned()
        .map(Json)
        .ok_or_else(|| MotoPlanError::validation("No route has been planned yet").into())
}

async fn insight<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<InsightRequest>,
) -> Result<Json<InsightResponse>, ApiError> {
    let planner = state.planner.try_lock().map_err(|_| ApiError::busy())?;
    let text = planner.insight(request.kind).await?;
    Ok(Json(InsightResponse { text }))
}

async fn list_routes<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<SavedRoute>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

async fn save_route<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
) -> Result<(StatusCode, Json<SavedRoute>), ApiError> {
    let planner = state.planner.try_lock().map_err(|_| ApiError::busy())?;
    let saved = planner.save_current(state.store.as_ref()).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_route<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One `routes` event with the whole collection now and after every change
async fn route_events<S: GeoServices + 'static>(
    State(state): State<AppState<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Route event stream opened");
    let receiver = state.store.watch();
    let events = stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first && receiver.changed().await.is_err() {
            return None;
        }
        let routes = receiver.borrow_and_update().clone();
        let event = Event::default()
            .event("routes")
            .json_data(&routes)
            .unwrap_or_else(|e| Event::default().comment(format!("encoding failed: {e}")));
        Some((Ok(event), (receiver, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Service;

    #[test]
    fn test_plan_failure_body() {
        let failure = PlanFailure {
            stage: PlanStage::FetchRoute,
            error: MotoPlanError::remote(Service::Routing, Some(403), "bad key"),
        };
        let api_error = ApiError::from(failure);
        assert_eq!(api_error.status, StatusCode::BAD_GATEWAY);

        let body = serde_json::to_value(&api_error.body).unwrap();
        assert_eq!(body["error"], "Routing Error: bad key");
        assert_eq!(body["stage"], "fetch_route");
        assert_eq!(body["reveal_settings"], true);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&MotoPlanError::UnknownRoute { id: "x".into() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&MotoPlanError::auth("Enter Gemini Key in settings")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&MotoPlanError::validation("Plan a route first")),
            StatusCode::BAD_REQUEST
        );
    }
}
