use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::{AppState, Args};
use crate::error::{AckError, ApiError};
use crate::Ack;

// ---

pub fn router(prefix: &str) -> Router<AppState> {
    // ---
    Router::new().route(&format!("{prefix}/api/set/alert/"), post(handler))
}

/// Add an alert threshold, given as a percentage of the tank's capacity.
///
/// The absolute threshold is fixed when the alert is created.
async fn handler(State(state): State<AppState>, args: Args) -> Result<Json<Ack>, AckError> {
    // ---
    let customer_id = args.required("customerId")?;
    let device_id = args.required("deviceId")?;
    let percentage = args.number("alertLevel")?;

    if !(0.0..=100.0).contains(&percentage) {
        return Err(ApiError::invalid("alertLevel", "must be between 0 and 100").into());
    }

    state
        .store
        .create_alert(customer_id, device_id, percentage)
        .await?;

    info!(customer_id, device_id, percentage, "Alert threshold set");
    Ok(Json(Ack::OK))
}
