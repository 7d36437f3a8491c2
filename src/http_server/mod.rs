//! HTTP server module

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{config::AppConfig, engine::IntakePipeline, persistence::traits::ErrorStore};

mod auth;
mod error;
mod errors;

pub use error::ApiError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Store used for reads.
    pub store: Arc<dyn ErrorStore>,
    /// Pipeline used for intake.
    pub pipeline: IntakePipeline,
}

/// Errors that can stop the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `server.listen_address` is not a socket address.
    #[error("Invalid server.listen_address '{0}': {1}")]
    InvalidAddress(String, std::net::AddrParseError),

    /// Binding or serving failed.
    #[error("HTTP server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    let errors = Router::new()
        .route("/errors", post(errors::submit_error))
        .route("/errors/{id}", get(errors::get_error))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth));

    Router::new().route("/health", get(health)).merge(errors).with_state(state)
}

/// Serves the API on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let app = router(state);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    tracing::info!("HTTP server stopped.");
    Ok(())
}

/// Binds `server.listen_address` and serves the API until `shutdown` is
/// cancelled.
pub async fn run_server_from_config(
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    let address = state.config.server.listen_address.clone();
    let addr: SocketAddr =
        address.parse().map_err(|e| ServerError::InvalidAddress(address.clone(), e))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening.");
    serve(listener, state, shutdown).await
}
