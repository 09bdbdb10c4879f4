//! End-to-end tests for the change delivery endpoint.
//!
//! Each test serves the real router on an ephemeral port, backed by an
//! in-memory sink, and talks to it over HTTP.

#![allow(clippy::panic, missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use firestore_changelog::api;
use firestore_changelog::app_state::AppState;
use firestore_changelog::domain::{DocumentPathTemplate, Operation};
use firestore_changelog::service::ChangeEventTranslator;
use firestore_changelog::sink::MemorySink;

async fn serve(sink: Arc<MemorySink>) -> SocketAddr {
    let translator = ChangeEventTranslator::new(
        sink,
        DocumentPathTemplate::new("acme-logistics", "fleet_records"),
    );
    let app = api::app(AppState::new(translator), Duration::from_secs(5));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn post_change(addr: SocketAddr, doc_id: &str, body: &Value) -> (u16, Value) {
    let client = reqwest::Client::new();
    let Ok(response) = client
        .post(format!("http://{addr}/api/v1/documents/{doc_id}/changes"))
        .json(body)
        .send()
        .await
    else {
        panic!("request failed");
    };
    let status = response.status().as_u16();
    let Ok(json) = response.json::<Value>().await else {
        panic!("response is not JSON");
    };
    (status, json)
}

#[tokio::test]
async fn create_is_mirrored_as_one_row() {
    let sink = Arc::new(MemorySink::new());
    let addr = serve(Arc::clone(&sink)).await;

    let (status, ack) = post_change(
        addr,
        "abc",
        &json!({
            "event_id": "evt-create",
            "after": {"fields": {"status": {"stringValue": "active"}}}
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(ack["operation"], json!("CREATE"));
    assert_eq!(ack["delivered"], json!(true));
    assert_eq!(ack["event_id"], json!("evt-create"));

    let rows = sink.rows().await;
    assert_eq!(rows.len(), 1);
    let Some(row) = rows.first() else {
        panic!("row recorded");
    };
    assert_eq!(row.operation, Operation::Create);
    assert_eq!(row.data, r#"{"status":"active"}"#);
    assert_eq!(row.old_data, "null");
    assert_eq!(row.document_id, "abc");
    assert_eq!(
        row.document_name,
        "projects/acme-logistics/databases/(default)/documents/fleet_records/abc"
    );
}

#[tokio::test]
async fn update_and_delete_carry_old_data() {
    let sink = Arc::new(MemorySink::new());
    let addr = serve(Arc::clone(&sink)).await;

    let (_, update) = post_change(
        addr,
        "abc",
        &json!({
            "before": {"fields": {"x": {"integerValue": "1"}}},
            "after": {"fields": {"x": {"integerValue": "2"}}}
        }),
    )
    .await;
    let (_, delete) = post_change(
        addr,
        "abc",
        &json!({
            "before": {"fields": {"status": {"stringValue": "active"}}},
            "after": null
        }),
    )
    .await;

    assert_eq!(update["operation"], json!("UPDATE"));
    assert_eq!(delete["operation"], json!("DELETE"));

    let rows = sink.rows().await;
    let summary: Vec<(Operation, &str, &str)> = rows
        .iter()
        .map(|r| (r.operation, r.data.as_str(), r.old_data.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Operation::Update, r#"{"x":2}"#, r#"{"x":1}"#),
            (Operation::Delete, "null", r#"{"status":"active"}"#),
        ]
    );
}

#[tokio::test]
async fn missing_event_id_is_generated() {
    let sink = Arc::new(MemorySink::new());
    let addr = serve(Arc::clone(&sink)).await;

    let (_, ack) = post_change(addr, "abc", &json!({"after": {"fields": {}}})).await;

    let Some(event_id) = ack["event_id"].as_str() else {
        panic!("event id present");
    };
    assert!(!event_id.is_empty());
    let rows = sink.rows().await;
    assert_eq!(rows.first().map(|r| r.event_id.as_str()), Some(event_id));
}

#[tokio::test]
async fn sink_rejection_is_acknowledged_not_propagated() {
    let sink = Arc::new(MemorySink::rejecting(["no such field: status"]));
    let addr = serve(Arc::clone(&sink)).await;

    let (status, ack) = post_change(
        addr,
        "abc",
        &json!({"after": {"fields": {"status": {"stringValue": "active"}}}}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(ack["delivered"], json!(false));
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn unknown_value_kind_is_rejected_before_translation() {
    let sink = Arc::new(MemorySink::new());
    let addr = serve(Arc::clone(&sink)).await;

    let (status, body) = post_change(
        addr,
        "abc",
        &json!({"after": {"fields": {"v": {"vectorValue": {}}}}}),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], json!(1001));
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let sink = Arc::new(MemorySink::new());
    let addr = serve(Arc::clone(&sink)).await;

    let (status, body) = post_change(addr, "abc", &json!({"before": "not a document"})).await;

    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], json!(1000));
    assert!(sink.is_empty().await);
}

#[tokio::test]
async fn health_reports_sink() {
    let addr = serve(Arc::new(MemorySink::new())).await;

    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status().as_u16(), 200);
    let Ok(body) = response.json::<Value>().await else {
        panic!("response is not JSON");
    };
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["sink"], json!("memory"));
}
