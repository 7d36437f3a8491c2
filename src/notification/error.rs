//! Error types for the notification channels.

use thiserror::Error;

use crate::http_client::HttpClientError;

/// Defines the possible errors that can occur while delivering an alert.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// An error related to invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The chat backend answered with a non-success status.
    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    /// One or more recipients could not be reached. Every recipient was
    /// attempted before this was returned.
    #[error("Delivery failed for {failed} of {attempted} recipients: {details}")]
    DeliveryFailed {
        /// How many recipients failed.
        failed: usize,
        /// How many recipients were attempted.
        attempted: usize,
        /// The individual failures, joined.
        details: String,
    },

    /// An error originating from building the HTTP client.
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] HttpClientError),

    /// An error from the underlying `reqwest` or `reqwest_middleware`
    /// libraries.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest_middleware::Error),
}

impl NotificationError {
    /// Folds per-recipient results into a single outcome.
    pub(crate) fn collect(
        results: Vec<(String, Result<(), NotificationError>)>,
    ) -> Result<(), NotificationError> {
        let attempted = results.len();
        let failures: Vec<String> = results
            .into_iter()
            .filter_map(|(recipient, result)| result.err().map(|e| format!("{recipient}: {e}")))
            .collect();
        if failures.is_empty() {
            return Ok(());
        }
        Err(NotificationError::DeliveryFailed {
            failed: failures.len(),
            attempted,
            details: failures.join("; "),
        })
    }
}
