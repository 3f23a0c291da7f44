//! # mentat-api
//!
//! HTTP surface of the mentat entry service: a JSON-RPC 2.0 endpoint that
//! forwards `entry.*` calls to the [`EntryGateway`], and a health check.

pub mod config;
pub mod rpc;
pub mod telemetry;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use mentat_core::EntryGateway;

/// Path of the JSON-RPC endpoint.
pub const RPC_PATH: &str = "/mentat/v1/";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: EntryGateway,
}

/// Build the service router over `gateway`.
pub fn router(gateway: EntryGateway) -> Router {
    Router::new()
        .route(RPC_PATH, post(rpc::handle))
        .route(RPC_PATH.trim_end_matches('/'), post(rpc::handle))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState { gateway })
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
