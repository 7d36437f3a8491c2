use serde_json::{Value, json};

use crate::helpers::*;

fn sample_report() -> Value {
    json!({
        "code": "DB_TIMEOUT",
        "message": "query timed out",
        "details": { "trace_id": "abc", "secret": "xyz" },
        "service": "billing",
        "operation": "charge"
    })
}

#[tokio::test]
async fn submit_returns_accepted_with_id_and_stores_record() {
    let server = TestServer::new(None).await;

    let resp = server.post_json("/errors", &sample_report()).await;

    assert_eq!(resp.status(), 202);
    let body: Value = resp.json().await.expect("Failed to parse JSON");
    let id = body["id"].as_str().expect("id should be a string").to_string();

    server.pipeline.drain().await;
    let resp = server.get(&format!("/errors/{id}")).await;
    assert_eq!(resp.status(), 200);
    let record: Value = resp.json().await.unwrap();
    assert_eq!(record["id"], id);
    assert_eq!(record["service"], "billing");
    assert_eq!(record["details"]["trace_id"], "abc");
    assert_eq!(record["alerted"], true);

    let sent = server.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("trace_id: abc"));
    assert!(!sent[0].body.contains("xyz"));

    server.cleanup();
}

#[tokio::test]
async fn submit_accepts_report_without_message_or_details() {
    let server = TestServer::new(None).await;

    let resp = server
        .post_json("/errors", &json!({ "code": "X", "service": "s", "operation": "o" }))
        .await;

    assert_eq!(resp.status(), 202);
    server.pipeline.drain().await;
    server.cleanup();
}

#[tokio::test]
async fn submit_rejects_report_missing_required_fields() {
    let server = TestServer::new(None).await;

    let resp = server.post_json("/errors", &json!({ "code": "X" })).await;

    assert!(resp.status().is_client_error());
    assert!(server.notifier.sent().is_empty());
    server.cleanup();
}

#[tokio::test]
async fn submit_returns_500_when_store_fails() {
    let store = create_test_store().await;
    let server = TestServer::with_store(store.clone(), None).await;
    store.close().await;

    let resp = server.post_json("/errors", &sample_report()).await;

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to record error report");
    server.pipeline.drain().await;
    assert!(server.notifier.sent().is_empty());
    server.cleanup();
}

#[tokio::test]
async fn get_returns_500_with_read_context_when_store_fails() {
    let store = create_test_store().await;
    let server = TestServer::with_store(store.clone(), None).await;
    store.close().await;

    let resp = server.get("/errors/some-id").await;

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to load error record");
    server.cleanup();
}

#[tokio::test]
async fn get_unknown_error_returns_404() {
    let server = TestServer::new(None).await;

    let resp = server.get("/errors/does-not-exist").await;

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Error record not found");
    server.cleanup();
}

#[tokio::test]
async fn submit_requires_bearer_token_when_configured() {
    let server = TestServer::new(Some("test-key")).await;

    let missing = server.post_json("/errors", &sample_report()).await;
    assert_eq!(missing.status(), 401);

    let wrong = server
        .client
        .post(server.url("/errors"))
        .bearer_auth("wrong")
        .json(&sample_report())
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), 401);

    let ok = server
        .client
        .post(server.url("/errors"))
        .bearer_auth("test-key")
        .json(&sample_report())
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), 202);

    server.pipeline.drain().await;
    server.cleanup();
}
