//! JSON-RPC 2.0 codec and method dispatch.
//!
//! Every call is answered with HTTP 200 and a JSON-RPC envelope. Gateway
//! outcomes, including rejections, travel in `result`; the `error` member is
//! reserved for codec failures and hard gateway errors.

use std::str::FromStr;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use mentat_core::EntryGateway;

use crate::AppState;

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
/// Hard failure reported by the gateway (e.g. malformed timestamp).
pub const OPERATION_FAILED: i32 = -32000;

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Entry service methods, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Add,
    Update,
    Delete,
    Cleanup,
    Stats,
    Search,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Add => "entry.Add",
            Method::Update => "entry.Update",
            Method::Delete => "entry.Delete",
            Method::Cleanup => "entry.Cleanup",
            Method::Stats => "entry.Stats",
            Method::Search => "entry.Search",
        }
    }
}

impl FromStr for Method {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry.Add" => Ok(Method::Add),
            "entry.Update" => Ok(Method::Update),
            "entry.Delete" => Ok(Method::Delete),
            "entry.Cleanup" => Ok(Method::Cleanup),
            "entry.Stats" => Ok(Method::Stats),
            "entry.Search" => Ok(Method::Search),
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {}", other),
            )),
        }
    }
}

/// `POST /mentat/v1/`
pub async fn handle(State(state): State<AppState>, body: Bytes) -> RpcResponse {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return RpcResponse::error(Value::Null, RpcError::new(PARSE_ERROR, e.to_string()))
        }
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);

    let request: RpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => return RpcResponse::error(id, RpcError::new(INVALID_REQUEST, e.to_string())),
    };
    if request.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::error(
            id,
            RpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
        );
    }

    let id = request.id.unwrap_or(Value::Null);
    let method = match request.method.parse::<Method>() {
        Ok(method) => method,
        Err(e) => return RpcResponse::error(id, e),
    };

    let start = Instant::now();
    let outcome = dispatch(&state.gateway, method, request.params).await;
    debug!(
        subsystem = "api",
        component = "rpc",
        rpc_method = method.as_str(),
        ok = outcome.is_ok(),
        duration_ms = start.elapsed().as_millis() as u64,
        "RPC call finished"
    );

    match outcome {
        Ok(result) => RpcResponse::success(id, result),
        Err(e) => RpcResponse::error(id, e),
    }
}

/// Decode params, run the gateway operation, encode its result.
pub async fn dispatch(
    gateway: &EntryGateway,
    method: Method,
    params: Value,
) -> Result<Value, RpcError> {
    match method {
        Method::Add => {
            let response = gateway
                .add(decode_params(params)?)
                .await
                .map_err(|e| operation_failed(method, e))?;
            encode(&response)
        }
        Method::Update => {
            let response = gateway
                .update(decode_params(params)?)
                .await
                .map_err(|e| operation_failed(method, e))?;
            encode(&response)
        }
        Method::Delete => encode(&gateway.delete(decode_params(params)?).await),
        Method::Cleanup => encode(&gateway.cleanup(decode_params(params)?).await),
        Method::Stats => encode(&gateway.stats(decode_params(params)?).await),
        Method::Search => encode(&gateway.search(decode_params(params)?).await),
    }
}

/// Accept the argument object directly or wrapped in a one-element array.
///
/// Absent params decode as an empty object so the gateway reports the
/// missing fields itself.
pub fn decode_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    let object = match params {
        Value::Null => Value::Object(Default::default()),
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        Value::Array(items) => {
            return Err(RpcError::new(
                INVALID_PARAMS,
                format!("expected one argument object, got {}", items.len()),
            ))
        }
        other => other,
    };
    serde_json::from_value(object).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))
}

fn encode<T: Serialize>(response: &T) -> Result<Value, RpcError> {
    serde_json::to_value(response).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

fn operation_failed(method: Method, err: mentat_core::Error) -> RpcError {
    warn!(
        subsystem = "api",
        component = "rpc",
        rpc_method = method.as_str(),
        error = %err,
        "Operation failed"
    );
    RpcError::new(OPERATION_FAILED, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentat_core::{AddEntryArgs, DeleteEntryArgs};
    use serde_json::json;

    #[test]
    fn test_method_names_round_trip() {
        for method in [
            Method::Add,
            Method::Update,
            Method::Delete,
            Method::Cleanup,
            Method::Stats,
            Method::Search,
        ] {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn test_unknown_method() {
        let err = "entry.Purge".parse::<Method>().unwrap_err();
        assert_eq!(err.code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_decode_params_object_and_array() {
        let object = json!({"userID": "alice", "type": "pim", "content": "x"});
        let direct: AddEntryArgs = decode_params(object.clone()).unwrap();
        let wrapped: AddEntryArgs = decode_params(json!([object])).unwrap();
        assert_eq!(direct.user_id, "alice");
        assert_eq!(wrapped.kind, "pim");
    }

    #[test]
    fn test_decode_params_accepts_legacy_field_names() {
        let args: DeleteEntryArgs =
            decode_params(json!({"userId": "alice", "UUIDs": ["a", "b"]})).unwrap();
        assert_eq!(args.user_id, "alice");
        assert_eq!(args.uuids, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_params_rejects_bad_shapes() {
        let err = decode_params::<AddEntryArgs>(json!([{}, {}])).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);

        let err = decode_params::<AddEntryArgs>(json!({"tags": "not-a-list"})).unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn test_missing_params_decode_as_defaults() {
        let args: AddEntryArgs = decode_params(Value::Null).unwrap();
        assert!(args.user_id.is_empty());
    }
}
