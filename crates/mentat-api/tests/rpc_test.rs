//! Router-level tests: JSON-RPC codec, dispatch and health check over the
//! in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use mentat_api::rpc::{
    INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, OPERATION_FAILED, PARSE_ERROR,
};
use mentat_api::{router, RPC_PATH};
use mentat_core::{EntryGateway, MemoryEntryStore};

fn app() -> Router {
    router(EntryGateway::new(Arc::new(MemoryEntryStore::new())))
}

async fn post_raw(app: &Router, body: impl Into<Body>) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(RPC_PATH)
                .header("content-type", "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn call(app: &Router, method: &str, params: Value) -> Value {
    post_raw(
        app,
        json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": [params]}).to_string(),
    )
    .await
}

fn result(reply: &Value) -> &Value {
    assert!(reply.get("error").is_none(), "unexpected error: {}", reply);
    &reply["result"]
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_parse_error() {
    let reply = post_raw(&app(), "{not json").await;
    assert_eq!(reply["error"]["code"], PARSE_ERROR);
    assert_eq!(reply["id"], Value::Null);
}

#[tokio::test]
async fn test_invalid_request() {
    let app = app();

    let reply = post_raw(&app, json!({"id": 7, "params": {}}).to_string()).await;
    assert_eq!(reply["error"]["code"], INVALID_REQUEST);
    assert_eq!(reply["id"], 7);

    let reply = post_raw(
        &app,
        json!({"jsonrpc": "1.0", "id": 8, "method": "entry.Stats"}).to_string(),
    )
    .await;
    assert_eq!(reply["error"]["code"], INVALID_REQUEST);
}

#[tokio::test]
async fn test_method_not_found() {
    let reply = call(&app(), "entry.Purge", json!({})).await;
    assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(reply["id"], 1);
}

#[tokio::test]
async fn test_invalid_params() {
    let reply = call(&app(), "entry.Add", json!({"userID": "alice", "tags": 3})).await;
    assert_eq!(reply["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn test_rejections_travel_in_result() {
    let reply = call(&app(), "entry.Add", json!({"type": "pim", "content": "x"})).await;
    assert_eq!(result(&reply)["message"], "User ID is missing");
}

#[tokio::test]
async fn test_malformed_timestamp_is_rpc_error() {
    let reply = call(
        &app(),
        "entry.Add",
        json!({"userID": "alice", "type": "org", "content": "x", "deadline": "tomorrow"}),
    )
    .await;
    assert_eq!(reply["error"]["code"], OPERATION_FAILED);
    assert!(reply["error"]["message"]
        .as_str()
        .unwrap()
        .contains("tomorrow"));
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let app = app();

    let added = call(
        &app,
        "entry.Add",
        json!({
            "userID": "alice",
            "type": "org",
            "content": "* TODO write docs",
            "tags": ["Docs"],
            "todoStatus": "todo",
            "priority": "#B",
            "scheduled": "2024-05-01T10:00:00.000Z",
            "metadata": {"description": "documentation pass"}
        }),
    )
    .await;
    let uuid = result(&added)["message"].as_str().unwrap().to_string();
    assert!(Uuid::parse_str(&uuid).is_ok());

    let updated = call(
        &app,
        "entry.Update",
        json!({"userID": "alice", "uuid": uuid, "todoStatus": "done"}),
    )
    .await;
    assert_eq!(result(&updated)["message"], "updated");

    let found = call(
        &app,
        "entry.Search",
        json!({"userID": "alice", "tags": ["DOCS"]}),
    )
    .await;
    let found = result(&found);
    assert_eq!(found["error"], "");
    assert_eq!(found["count"], 1);
    let entry = &found["entries"][0];
    assert_eq!(entry["uuid"], uuid.as_str());
    assert_eq!(entry["type"], "org");
    assert_eq!(entry["todoStatus"], "DONE");
    assert_eq!(entry["tags"], json!(["docs"]));
    assert_eq!(entry["metadata"]["description"], "documentation pass");

    let stats = call(&app, "entry.Stats", json!({"userID": "alice"})).await;
    let stats = result(&stats);
    assert_eq!(stats["whole"], 1);
    assert_eq!(stats["org"], -1);

    let deleted = call(
        &app,
        "entry.Delete",
        json!({"userID": "alice", "uuids": [uuid]}),
    )
    .await;
    assert_eq!(result(&deleted)["deletedCount"], 1);
    assert_eq!(result(&deleted)["error"], "");

    let cleaned = call(&app, "entry.Cleanup", json!({"userID": "alice"})).await;
    assert_eq!(result(&cleaned)["deletedCount"], 0);
}

#[tokio::test]
async fn test_params_as_bare_object() {
    let reply = post_raw(
        &app(),
        json!({
            "jsonrpc": "2.0",
            "id": "abc",
            "method": "entry.Search",
            "params": {"userID": "bob"}
        })
        .to_string(),
    )
    .await;
    assert_eq!(reply["id"], "abc");
    assert_eq!(result(&reply)["count"], 0);
    assert_eq!(result(&reply)["entries"], json!([]));
}

#[tokio::test]
async fn test_null_params_are_treated_as_absent() {
    let app = app();

    let added = call(
        &app,
        "entry.Add",
        json!({
            "userID": "alice",
            "type": "pim",
            "content": "x",
            "priority": null,
            "tags": null,
            "metadata": null
        }),
    )
    .await;
    let uuid = result(&added)["message"].as_str().unwrap().to_string();
    assert!(Uuid::parse_str(&uuid).is_ok());

    let stats = call(
        &app,
        "entry.Stats",
        json!({"userID": "alice", "detailed": null}),
    )
    .await;
    assert_eq!(result(&stats)["whole"], 1);
    assert_eq!(result(&stats)["pim"], -1);

    let found = call(
        &app,
        "entry.Search",
        json!({"userID": "alice", "types": null, "tags": null, "priority": null}),
    )
    .await;
    let entry = &result(&found)["entries"][0];
    assert_eq!(entry["uuid"], uuid.as_str());
    assert_eq!(entry["tags"], json!([]));
    assert!(entry.get("priority").is_none());
    assert!(entry.get("metadata").is_none());
}
