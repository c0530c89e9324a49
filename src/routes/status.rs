use axum::{extract::State, routing::get, Json, Router};
use tracing::debug;

use super::{AppState, Args};
use crate::error::{ApiError, ApiResult};
use crate::MeterStatus;

// ---

pub fn router(prefix: &str) -> Router<AppState> {
    // ---
    Router::new().route(&format!("{prefix}/api/get/status/"), get(handler))
}

/// Full meter status for a customer (`c`), or a device (`d`).
async fn handler(State(state): State<AppState>, args: Args) -> ApiResult<Json<MeterStatus>> {
    // ---
    let key = args.lookup_key()?;
    debug!(%key, "GET status");

    state
        .store
        .get_status(&key)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(key.to_string()))
}
