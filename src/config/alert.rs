use std::time::Duration;

use serde::Deserialize;

use super::{deserialize_duration_from_minutes, deserialize_string_list};

fn default_cooldown() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_visible_details() -> Vec<String> {
    vec!["trace_id".to_string(), "user_id".to_string()]
}

/// Alerting parameters shared by the throttler and the renderer.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    /// Minimum time between two alerts for the same service and operation.
    #[serde(
        rename = "cooldown_minutes",
        default = "default_cooldown",
        deserialize_with = "deserialize_duration_from_minutes"
    )]
    pub cooldown: Duration,

    /// Detail keys that may appear in an alert. `*` shows every key.
    #[serde(default = "default_visible_details", deserialize_with = "deserialize_string_list")]
    pub visible_details: Vec<String>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { cooldown: default_cooldown(), visible_details: default_visible_details() }
    }
}
