use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::{AppState, Args};
use crate::error::{AckError, ApiError};
use crate::Ack;

// ---

pub fn router(prefix: &str) -> Router<AppState> {
    // ---
    Router::new().route(&format!("{prefix}/api/register/customer/"), post(handler))
}

/// Register a meter for a customer with its full-tank calibration.
async fn handler(State(state): State<AppState>, args: Args) -> Result<Json<Ack>, AckError> {
    // ---
    let device_id = args.required("deviceId")?;
    let customer_id = args.required("customerId")?;
    let max_weight = args.number("maxWeight")?;

    if max_weight <= 0.0 {
        return Err(ApiError::invalid("maxWeight", "must be positive").into());
    }

    state
        .store
        .register_device(customer_id, device_id, max_weight)
        .await?;

    info!(customer_id, device_id, max_weight, "Registered meter");
    Ok(Json(Ack::OK))
}
