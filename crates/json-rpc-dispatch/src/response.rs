use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response.
///
/// Field order is the wire order: `jsonrpc`, `result`, `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: Option<RequestId>,
}

impl JsonRpcResponse {
    pub fn new(id: Option<RequestId>, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }
}

/// The `error` member of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
}

impl From<&RpcError> for ErrorObject {
    fn from(err: &RpcError) -> Self {
        Self {
            code: err.code().code(),
            message: err.message().to_string(),
        }
    }
}

/// An error response. `id` is `null` when the failing call could not be
/// correlated.
///
/// Field order is the wire order: `jsonrpc`, `error`, `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: ErrorObject,
    pub id: Option<RequestId>,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error,
            id,
        }
    }
}

/// Either a result or an error envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Successful response with result field
    Response(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcErrorResponse),
}

impl JsonRpcMessage {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self::Response(JsonRpcResponse::new(id, result))
    }

    /// Error envelope built from the code and message of `error`
    pub fn error(id: Option<RequestId>, error: &RpcError) -> Self {
        Self::Error(JsonRpcErrorResponse::new(id, error.into()))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Response(resp) => resp.id.as_ref(),
            JsonRpcMessage::Error(err) => err.id.as_ref(),
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcErrorResponse> for JsonRpcMessage {
    fn from(error: JsonRpcErrorResponse) -> Self {
        Self::Error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_string};

    #[test]
    fn test_result_envelope_key_order() {
        let response = JsonRpcMessage::success(Some(RequestId::Number(1)), json!(19));
        assert_eq!(
            to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","result":19,"id":1}"#
        );
    }

    #[test]
    fn test_error_envelope_key_order() {
        let response = JsonRpcMessage::error(
            Some(RequestId::String("1".to_string())),
            &RpcError::method_not_found(),
        );
        assert_eq!(
            to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":"1"}"#
        );
    }

    #[test]
    fn test_uncorrelated_error_has_null_id() {
        let response = JsonRpcMessage::error(None, &RpcError::invalid_request("Invalid Request"));
        assert!(response.is_error());
        assert_eq!(response.id(), None);
        assert_eq!(
            to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request"},"id":null}"#
        );
    }

    #[test]
    fn test_message_parses_back() {
        let parsed: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":["hello",5],"id":"9"}"#).unwrap();
        assert!(!parsed.is_error());
        assert_eq!(parsed.id(), Some(&RequestId::String("9".to_string())));

        let parsed: JsonRpcMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":"5"}"#,
        )
        .unwrap();
        assert!(parsed.is_error());
    }
}
