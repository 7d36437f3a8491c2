//! The Supervisor module manages the lifecycle of the Sentinel service.
//!
//! The `Supervisor` owns the HTTP intake server, the intake pipeline and the
//! database connection.
//!
//! ## Responsibilities
//!
//! - **Initialization**: The `SupervisorBuilder` wires the store, notifier,
//!   renderer and pipeline together from configuration.
//! - **Graceful Shutdown**: On SIGINT or SIGTERM it stops accepting requests,
//!   waits up to `shutdown_timeout` for in-flight alerts, then closes the
//!   database pool.
//! - **Task Supervision**: If the HTTP server fails, the supervisor shuts the
//!   rest down instead of running without an intake.

mod builder;

use std::sync::Arc;

pub use builder::SupervisorBuilder;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    engine::IntakePipeline,
    http_server::{self, ApiState, ServerError},
    notification::error::NotificationError,
    persistence::SqliteErrorStore,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// An error store was not provided to the `SupervisorBuilder`.
    #[error("Missing error store for Supervisor")]
    MissingStore,

    /// The notifier could not be built from configuration.
    #[error("Notifier initialization failed: {0}")]
    Notifier(#[from] NotificationError),

    /// The HTTP server stopped with an error.
    #[error("HTTP server failed: {0}")]
    Server(#[from] ServerError),
}

/// The primary runtime manager for the application.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The error store, closed on shutdown.
    store: Arc<SqliteErrorStore>,

    /// The intake pipeline shared with the HTTP handlers.
    pipeline: IntakePipeline,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: tokio::task::JoinSet<Result<(), ServerError>>,
}

impl Supervisor {
    /// Creates a new Supervisor instance with all its required components.
    pub fn new(config: AppConfig, store: Arc<SqliteErrorStore>, pipeline: IntakePipeline) -> Self {
        Self {
            config: Arc::new(config),
            store,
            pipeline,
            cancellation_token: CancellationToken::new(),
            join_set: tokio::task::JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// A token that stops the supervisor when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// The pipeline the HTTP server submits to.
    pub fn pipeline(&self) -> &IntakePipeline {
        &self.pipeline
    }

    /// Runs the service until a shutdown signal arrives or the HTTP server
    /// fails, then shuts down gracefully.
    pub async fn run(mut self) -> Result<(), SupervisorError> {
        let cancellation_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            let ctrl_c = signal::ctrl_c();
            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to register SIGTERM handler.");
                        std::future::pending::<()>().await;
                    }
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
                _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
                _ = cancellation_token.cancelled() => return Ok(()),
            }

            cancellation_token.cancel();
            Ok(())
        });

        let state = ApiState {
            config: Arc::clone(&self.config),
            store: Arc::clone(&self.store) as _,
            pipeline: self.pipeline.clone(),
        };
        let http_cancellation_token = self.cancellation_token.clone();
        self.join_set.spawn(async move {
            let result = http_server::run_server_from_config(state, http_cancellation_token).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "HTTP server failed.");
            }
            result
        });

        let mut failure = None;
        while let Some(joined) = self.join_set.join_next().await {
            let outcome = match joined {
                Ok(result) => result.map_err(SupervisorError::from),
                Err(e) => {
                    tracing::error!("A supervised task panicked: {:?}.", e);
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                failure.get_or_insert(e);
            }
            // Any task ending means the service is going down.
            self.cancellation_token.cancel();
        }
        tracing::info!("All supervised tasks have completed.");

        tracing::info!("Starting graceful resource cleanup...");
        let shutdown_timeout = self.config.shutdown_timeout;
        if self.pipeline.shutdown(shutdown_timeout).await {
            tracing::info!("All in-flight alerts completed.");
        } else {
            tracing::warn!(
                "In-flight alerts did not complete within the timeout of {:?}. Continuing shutdown.",
                shutdown_timeout
            );
        }
        self.store.close().await;

        tracing::info!("Supervisor shutdown complete.");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
