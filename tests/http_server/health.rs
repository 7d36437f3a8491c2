use crate::helpers::*;

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = TestServer::new(None).await;

    let resp = server.get("/health").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");

    server.cleanup();
}

#[tokio::test]
async fn health_endpoint_does_not_require_api_key() {
    let server = TestServer::new(Some("test-key")).await;

    let resp = server.get("/health").await;

    assert_eq!(resp.status(), 200);

    server.cleanup();
}
