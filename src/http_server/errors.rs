//! Handlers for the `/errors` endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use super::{ApiError, ApiState};
use crate::models::ErrorReport;

/// Response body of a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// The id assigned to the stored record.
    pub id: String,
}

/// Records an error report. The alert decision happens after the response.
pub async fn submit_error(
    State(state): State<ApiState>,
    Json(report): Json<ErrorReport>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.pipeline.submit(report).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { id: record.id })))
}

/// Retrieves a stored error record by id.
pub async fn get_error(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .store
        .get(&id)
        .await
        .map_err(|e| ApiError::internal("Failed to load error record", e))?;
    match record {
        Some(record) => Ok((StatusCode::OK, Json(record))),
        None => Err(ApiError::NotFound("Error record not found".to_string())),
    }
}
