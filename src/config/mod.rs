//! Configuration module for Sentinel.

mod alert;
mod app_config;
mod helpers;
mod http_base;
mod http_retry;
mod server;

pub use alert::AlertConfig;
pub use app_config::{AppConfig, AppConfigBuilder, AppConfigError};
pub use helpers::{
    deserialize_duration_from_minutes, deserialize_duration_from_ms,
    deserialize_duration_from_seconds, deserialize_string_list, serialize_duration_to_minutes,
    serialize_duration_to_ms, serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use server::ServerConfig;
