//! JSON-RPC 2.0 message types for the cross-reference protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use xylem_serving::ServingError;

/// Standard JSON-RPC error codes.
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Server-defined error codes for engine failures.
pub const UNIMPLEMENTED: i32 = -32001;
pub const NOT_FOUND: i32 = -32002;
pub const STORE_ERROR: i32 = -32003;

/// An incoming request.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

/// An outgoing response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// The error half of a response.
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl Response {
    /// A successful response carrying a serialized result.
    pub fn success(id: Option<Value>, result: impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self {
                jsonrpc: "2.0",
                result: Some(value),
                error: None,
                id,
            },
            Err(err) => Self::error(id, INTERNAL_ERROR, format!("serialize reply: {err}")),
        }
    }

    /// An error response with an explicit code.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }

    /// The request was not valid JSON.
    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "parse error")
    }

    /// The request's params did not match the method's schema.
    pub fn invalid_params(id: Option<Value>, detail: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, detail)
    }

    /// The method name is not part of the protocol.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("unknown method {method:?}"))
    }

    /// Maps an engine failure onto the protocol's error codes.
    pub fn engine_error(id: Option<Value>, err: &ServingError) -> Self {
        let code = match err {
            ServingError::InvalidTicket { .. }
            | ServingError::InvalidEdgeKind(_)
            | ServingError::Filter(_) => INVALID_PARAMS,
            ServingError::Unimplemented(_) => UNIMPLEMENTED,
            ServingError::FileNotFound(_) => NOT_FOUND,
            ServingError::Store(_) => STORE_ERROR,
            ServingError::Inconsistent(_) | ServingError::Join(_) => INTERNAL_ERROR,
        };
        Self::error(id, code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let response = Response::success(Some(Value::from(7)), serde_json::json!({"ok": true}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["result"]["ok"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_engine_error_codes() {
        let unimplemented = ServingError::Unimplemented("edge pagination");
        let response = Response::engine_error(Some(Value::from(1)), &unimplemented);
        let error = response.error.unwrap();
        assert_eq!(error.code, UNIMPLEMENTED);
        assert!(error.message.contains("unimplemented"));

        let missing = ServingError::FileNotFound("xylem://c?path=f".into());
        let response = Response::engine_error(None, &missing);
        assert_eq!(response.error.unwrap().code, NOT_FOUND);
    }

    #[test]
    fn test_request_accepts_missing_id() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"xrefs.nodes"}"#).unwrap();
        assert_eq!(request.method, "xrefs.nodes");
        assert!(request.id.is_none());
        assert!(request.params.is_null());
    }
}
