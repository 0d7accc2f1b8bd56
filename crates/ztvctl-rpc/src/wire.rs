//! Wire types.
//!
//! One JSON object per line, `\n` terminated. No batching. Inbound lines are
//! framed by the client's read loop.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// Protocol version stamped on every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub const fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    /// Serialize as a single newline-terminated frame.
    pub fn to_line(&self) -> Result<Vec<u8>, RpcError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcResponse {
    /// Convert into the caller-facing outcome. A response with neither
    /// `result` nor `error` resolves to `null`.
    pub fn into_outcome(self) -> Result<Value, RpcError> {
        match self.error {
            Some(err) => Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest::new(7, "removeChannel", json!({"channelId": 3}));
        let line = request.to_line().unwrap();
        let text = String::from_utf8(line).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.starts_with(r#"{"jsonrpc":"2.0","id":7,"method":"removeChannel""#));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":{"status":"ok"}}"#;
        let response: RpcResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.id, Some(1));
        assert_eq!(response.into_outcome().unwrap(), json!({"status": "ok"}));
    }

    #[test]
    fn test_error_response_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid Request"}}"#;
        let response: RpcResponse = serde_json::from_str(json).unwrap();
        let err = response.into_outcome().unwrap_err();
        assert_eq!(err.remote_code(), Some(-32600));
    }

    #[test]
    fn test_empty_response_resolves_null() {
        let response: RpcResponse = serde_json::from_str(r#"{"id":4}"#).unwrap();
        assert_eq!(response.into_outcome().unwrap(), Value::Null);
    }
}
