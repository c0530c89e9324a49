use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, info};

use super::{AppState, Args};
use crate::error::{AckError, ApiError, ApiResult};
use crate::{Ack, LevelReading, MeterKey, MeterKind};

// ---

pub fn router(prefix: &str) -> Router<AppState> {
    // ---
    Router::new()
        .route(&format!("{prefix}/api/update/level/"), post(update_level))
        .route(&format!("{prefix}/api/get/level/"), get(get_level))
}

/// Record a sensor reading, then evaluate alerts in the background.
///
/// The identifier parameter is `deviceId` or `customerId` depending on the
/// configured `LEVEL_UPDATE_KEY`.
async fn update_level(State(state): State<AppState>, args: Args) -> Result<Json<Ack>, AckError> {
    // ---
    let kind = state.config.level_update_key;
    let id_param = match kind {
        MeterKind::Device => "deviceId",
        MeterKind::Customer => "customerId",
    };

    let id = args.required(id_param)?;
    let level = args.number("level")?;
    if level < 0.0 {
        return Err(ApiError::invalid("level", "must not be negative").into());
    }

    let key = MeterKey::new(kind, id);
    let updated = state
        .store
        .update_level(&key, level, args.get("wirelessNetwork"))
        .await?;

    if updated == 0 {
        return Err(ApiError::NotFound(key.to_string()).into());
    }

    info!(%key, level, updated, "Level updated");
    state.alerts.dispatch(key, level);

    Ok(Json(Ack::OK))
}

/// Current and maximum level for a device (`d`) or customer (`c`).
async fn get_level(State(state): State<AppState>, args: Args) -> ApiResult<Json<LevelReading>> {
    // ---
    let key = args.lookup_key()?;
    debug!(%key, "GET level");

    match state.store.get_level(&key).await? {
        Some(reading) => Ok(Json(reading)),
        None => Err(ApiError::NotFound(key.to_string())),
    }
}
