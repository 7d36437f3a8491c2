//! Defines the custom `ApiError` type for the HTTP server.

use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::engine::IntakeError;

/// A custom error type for the API that can be converted into an HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// Represents an unauthorized request.
    Unauthorized,

    /// Represents a resource that could not be found.
    NotFound(String),

    /// Represents an internal failure. `message` is returned to the client,
    /// `cause` is only logged.
    InternalServerError {
        /// What the request was trying to do.
        message: String,
        /// The underlying error.
        cause: String,
    },
}

impl ApiError {
    /// Builds an `InternalServerError` from a client-facing message and the
    /// error that caused it.
    pub fn internal(message: impl Into<String>, cause: impl Display) -> Self {
        ApiError::InternalServerError { message: message.into(), cause: cause.to_string() }
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        ApiError::internal("Failed to record error report", err)
    }
}

/// Implements the conversion from `ApiError` into an `axum` response.
///
/// This is the central point for mapping internal application errors to
/// user-facing HTTP responses.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ApiError::Unauthorized =>
                (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            ApiError::InternalServerError { message, cause } => {
                tracing::error!(error = %cause, "{}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
        };

        (status, Json(body)).into_response()
    }
}
