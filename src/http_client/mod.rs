//! This module builds the retrying HTTP clients notifiers send through.

mod client;

pub use client::{HttpClientError, build_notifier_client, create_retryable_http_client};
