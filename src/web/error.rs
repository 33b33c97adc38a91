// Error types for the API server

use crate::scan::ScanError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// API server error types
#[derive(Debug)]
pub enum ApiError {
    /// The request or the image inside it cannot be processed.
    BadRequest(String),
    /// The request body is over the configured size limit.
    PayloadTooLarge(String),
    /// Anything else. The message is returned to the client as-is.
    InternalServerError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(msg) | Self::PayloadTooLarge(msg) | Self::InternalServerError(msg) => {
                msg
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Oversized bodies keep their 413; every other body problem is the client's JSON.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(rejection.body_text()),
            _ => Self::BadRequest(rejection.body_text()),
        }
    }
}

// Every ScanError stems from the submitted image, so all of them are client errors.
impl From<ScanError> for ApiError {
    fn from(error: ScanError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::InternalServerError(format!("Scan task failed: {}", error))
    }
}
