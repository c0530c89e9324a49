//! HTTP-facing error types.
//!
//! Read routes answer failures with a short plain-text body; write routes
//! answer with `{"success": false}`. Both share the same status mapping and
//! neither ever exposes storage details to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::store::StoreError;
use crate::Ack;

// ---

pub const MISSING_ARGUMENTS: &str = "Request Argument(s) missing";
pub const INVALID_ARGUMENT: &str = "Invalid Argument";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required parameter is absent or empty.
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),

    /// A parameter is present but malformed or out of range.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// The identifier matched no meter.
    #[error("no meter matches {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    // ---
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingArgument(_) | ApiError::InvalidArgument { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) | ApiError::Store(StoreError::UnknownDevice { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(StoreError::DuplicateDevice(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation failures keep their descriptive text on every route.
    fn validation_body(&self) -> Option<&'static str> {
        match self {
            ApiError::MissingArgument(_) => Some(MISSING_ARGUMENTS),
            ApiError::InvalidArgument { .. } => Some(INVALID_ARGUMENT),
            _ => None,
        }
    }

    fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        self.log();
        let status = self.status();
        let body = match self.validation_body() {
            Some(text) => text,
            None if status == StatusCode::NOT_FOUND => INVALID_ARGUMENT,
            None => "Internal Server Error",
        };
        (status, body).into_response()
    }
}

/// Error wrapper for the write routes, rendered as `{"success": false}`.
#[derive(Debug)]
pub struct AckError(pub ApiError);

impl From<ApiError> for AckError {
    fn from(err: ApiError) -> Self {
        AckError(err)
    }
}

impl From<StoreError> for AckError {
    fn from(err: StoreError) -> Self {
        AckError(ApiError::Store(err))
    }
}

impl IntoResponse for AckError {
    fn into_response(self) -> Response {
        // ---
        let AckError(err) = self;
        match err.validation_body() {
            Some(_) => err.into_response(),
            None => {
                err.log();
                (err.status(), Json(Ack::FAILED)).into_response()
            }
        }
    }
}
