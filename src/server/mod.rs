//! HTTP Server
//!
//! Axum surface exposed to the surrounding application. Routing and state
//! wiring live here; per-endpoint behavior lives in [`routes`].

mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::orchestrator::Orchestrator;
use crate::types::Result;

/// Shared state every handler sees
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Feature-disable flag: short-circuits all endpoints with a fixed
    /// "service disabled" response.
    pub disabled: bool,
}

/// Build the API router
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/generate", post(routes::generate))
        .route("/status", get(routes::status))
        .route("/refine", post(routes::refine))
        .route("/skybox", post(routes::skybox))
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves
pub async fn serve<F>(state: Arc<AppState>, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = api_routes(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
