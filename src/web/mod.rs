//! HTTP server for the planner UI

mod routes;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::GeoServices;
use crate::planner::RoutePlanner;
use crate::store::RouteStore;

/// Shared server state: one planner session and the user's saved routes
pub struct AppState<S> {
    planner: Arc<Mutex<RoutePlanner<S>>>,
    store: Arc<dyn RouteStore>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            planner: Arc::clone(&self.planner),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GeoServices> AppState<S> {
    pub fn new(planner: RoutePlanner<S>, store: Arc<dyn RouteStore>) -> Self {
        Self {
            planner: Arc::new(Mutex::new(planner)),
            store,
        }
    }
}

/// The full application router
pub fn app<S: GeoServices + 'static>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until interrupted
pub async fn run<S: GeoServices + 'static>(port: u16, state: AppState<S>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://localhost:{}", port);
    serve(listener, state).await
}

/// Serve on an already bound listener until interrupted
pub async fn serve<S: GeoServices + 'static>(
    listener: TcpListener,
    state: AppState<S>,
) -> anyhow::Result<()> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server stopped unexpectedly")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C, serving until killed: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down web server");
}
