//! Route gateway: assembles every sub-router, the shared state and the
//! middleware stack into the application [`Router`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::{FromRequest, Query, Request};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{Form, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::alerts::AlertEvaluator;
use crate::config::CorsConfig;
use crate::error::{ApiError, ApiResult};
use crate::store::LevelStore;
use crate::{Config, MeterKey};

mod alert;
mod health;
mod level;
mod register;
mod status;

// ---

/// Shared state handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LevelStore>,
    pub alerts: AlertEvaluator,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Result<Router> {
    // ---
    let prefix = state.config.path_prefix.clone();
    let cors = cors_layer(&state.config.cors)?;

    Ok(Router::new()
        .merge(health::router(&prefix))
        .merge(register::router(&prefix))
        .merge(level::router(&prefix))
        .merge(status::router(&prefix))
        .merge(alert::router(&prefix))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Build the CORS layer from configuration. Unparseable entries are a
/// startup error.
fn cors_layer(cors: &CorsConfig) -> Result<CorsLayer> {
    // ---
    let methods = cors
        .methods
        .iter()
        .map(|m| Method::from_bytes(m.as_bytes()).map_err(|e| anyhow!("Invalid CORS method '{m}': {e}")))
        .collect::<Result<Vec<_>>>()?;

    let headers = cors
        .headers
        .iter()
        .map(|h| HeaderName::from_bytes(h.as_bytes()).map_err(|e| anyhow!("Invalid CORS header '{h}': {e}")))
        .collect::<Result<Vec<_>>>()?;

    let layer = CorsLayer::new().allow_methods(methods).allow_headers(headers);

    match &cors.origins {
        None => Ok(layer.allow_origin(Any)),
        Some(origins) => {
            let origins = origins
                .iter()
                .map(|o| HeaderValue::from_str(o).map_err(|e| anyhow!("Invalid CORS origin '{o}': {e}")))
                .collect::<Result<Vec<_>>>()?;
            Ok(layer.allow_origin(origins))
        }
    }
}

/// Request parameters merged from the query string and, for non-GET
/// requests, a url-encoded form body. Body values win over query values.
#[derive(Debug, Default)]
pub struct Args(HashMap<String, String>);

impl<S> FromRequest<S> for Args
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // ---
        let mut args = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map(|Query(q)| q)
            .unwrap_or_default();

        if req.method() != Method::GET && req.method() != Method::HEAD {
            // Anything that is not a form body simply contributes nothing
            if let Ok(Form(body)) = Form::<HashMap<String, String>>::from_request(req, state).await {
                args.extend(body);
            }
        }

        Ok(Args(args))
    }
}

impl Args {
    // ---
    /// Trimmed value of `name`; empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &'static str) -> ApiResult<&str> {
        self.get(name).ok_or(ApiError::MissingArgument(name))
    }

    /// Required finite number.
    pub fn number(&self, name: &'static str) -> ApiResult<f64> {
        let raw = self.required(name)?;
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(ApiError::invalid(name, format!("{raw:?} is not a number"))),
        }
    }

    /// Meter addressed by the `d` (device) or `c` (customer) parameter;
    /// `d` takes precedence when both are given.
    pub fn lookup_key(&self) -> ApiResult<MeterKey> {
        if let Some(device_id) = self.get("d") {
            Ok(MeterKey::Device(device_id.to_string()))
        } else if let Some(customer_id) = self.get("c") {
            Ok(MeterKey::Customer(customer_id.to_string()))
        } else {
            Err(ApiError::MissingArgument("d"))
        }
    }
}
