use serde::Deserialize;

/// Configuration for the intake HTTP server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Optional API key required from reporting services.
    /// If not set in config, falls back to `SENTINEL_API_KEY` env var.
    #[serde(rename = "api_key", default = "default_api_key_from_env")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_address: default_listen_address(), api_key: None }
    }
}

/// Provides the default value for listen_address.
fn default_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Loads the API key from the `SENTINEL_API_KEY` environment variable.
fn default_api_key_from_env() -> Option<String> {
    std::env::var("SENTINEL_API_KEY").ok().filter(|key| !key.is_empty())
}
