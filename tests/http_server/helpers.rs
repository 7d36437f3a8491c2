use std::{net::SocketAddr, sync::Arc, time::Duration};

use reqwest::Client;
use sentinel::{
    config::AppConfig,
    engine::{IntakePipeline, SystemClock},
    http_server::{self, ApiState},
    notification::{AlertRenderer, ChannelKind},
    persistence::SqliteErrorStore,
    test_helpers::RecordingNotifier,
};
use serde_json::Value;
use tokio::task;
use tokio_util::sync::CancellationToken;

pub async fn create_test_store() -> Arc<SqliteErrorStore> {
    let store = SqliteErrorStore::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store");
    store.run_migrations().await.expect("Failed to run migrations");
    Arc::new(store)
}

pub struct TestServer {
    pub address: SocketAddr,
    pub server_handle: task::JoinHandle<()>,
    pub client: Client,
    pub store: Arc<SqliteErrorStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub pipeline: IntakePipeline,
    shutdown: CancellationToken,
}

impl TestServer {
    pub async fn new(api_key: Option<&str>) -> Self {
        Self::with_store(create_test_store().await, api_key).await
    }

    pub async fn with_store(store: Arc<SqliteErrorStore>, api_key: Option<&str>) -> Self {
        let mut builder = AppConfig::builder()
            .environment("test")
            .database_url("sqlite::memory:")
            .visible_details(&["trace_id"]);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let config = builder.build();

        let notifier = Arc::new(RecordingNotifier::new(ChannelKind::Plain));
        let pipeline = IntakePipeline::new(
            store.clone(),
            notifier.clone(),
            AlertRenderer::new(&config.environment, &config.alert.visible_details),
            config.alert.cooldown,
            Arc::new(SystemClock),
        );
        let state = ApiState {
            config: Arc::new(config),
            store: store.clone(),
            pipeline: pipeline.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let address = listener.local_addr().expect("Failed to get address");
        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();
        let server_handle = task::spawn(async move {
            http_server::serve(listener, state, server_shutdown).await.expect("Server failed");
        });

        Self {
            address,
            server_handle,
            client: Client::builder().timeout(Duration::from_secs(5)).build().unwrap(),
            store,
            notifier,
            pipeline,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.expect("Request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(body).send().await.expect("Request failed")
    }

    pub fn cleanup(self) {
        self.shutdown.cancel();
        self.server_handle.abort();
    }
}
