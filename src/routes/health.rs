// src/routes/health.rs
//! Liveness endpoints.
//!
//! - `GET {prefix}/` answers plain-text `OK`, the probe the sensors and
//!   the load balancer already use.
//! - `GET /health` answers `{"status":"ok"}` for container orchestrators.
//!
//! Neither touches the database or any other external service.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn root() -> &'static str {
    "OK"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter with the liveness routes.
///
/// Generic over the application state so it merges cleanly with the
/// gateway router.
pub fn router<S>(prefix: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = Router::new()
        .route("/health", get(health))
        .route(&format!("{prefix}/"), get(root));

    if !prefix.is_empty() {
        router = router.route(prefix, get(root));
    }
    router
}
