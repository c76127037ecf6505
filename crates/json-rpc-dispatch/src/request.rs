use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RpcError;
use crate::notification::JsonRpcNotification;
use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object (JSON-RPC 2.0 only)
    Object(Map<String, Value>),
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams::Array(Vec::new())
    }
}

impl RequestParams {
    /// Get a parameter by name (for object params)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (for array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Object(map) => map.len(),
            RequestParams::Array(vec) => vec.len(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }

    /// Deserialize the parameters into a typed struct (or tuple for
    /// positional params). Fails with `INVALID_PARAMS`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        serde_json::from_value(self.to_value())
            .map_err(|e| RpcError::invalid_params(format!("Invalid params: {}", e)).with_cause(e))
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// A JSON-RPC request: a call carrying a correlation id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    #[serde(rename = "jsonrpc", skip_serializing_if = "JsonRpcVersion::is_v1")]
    pub version: JsonRpcVersion,
    pub method: String,
    pub params: RequestParams,
    /// `None` only for a JSON-RPC 2.0 call that sent `"id": null`
    pub id: Option<RequestId>,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: RequestParams) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id: Some(id),
        }
    }

    /// Create a new request with no parameters
    pub fn new_no_params(id: RequestId, method: impl Into<String>) -> Self {
        Self::new(id, method, RequestParams::default())
    }

    pub fn with_version(mut self, version: JsonRpcVersion) -> Self {
        self.version = version;
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.get_index(index)
    }
}

/// A successfully validated call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Notification(JsonRpcNotification),
    Request(JsonRpcRequest),
}

impl Call {
    pub fn method(&self) -> &str {
        match self {
            Call::Notification(n) => &n.method,
            Call::Request(r) => &r.method,
        }
    }

    pub fn params(&self) -> &RequestParams {
        match self {
            Call::Notification(n) => &n.params,
            Call::Request(r) => &r.params,
        }
    }

    pub fn version(&self) -> JsonRpcVersion {
        match self {
            Call::Notification(n) => n.version,
            Call::Request(r) => r.version,
        }
    }

    /// Correlation id; `None` for notifications and for null-id requests
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Call::Notification(_) => None,
            Call::Request(r) => r.id.as_ref(),
        }
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, Call::Notification(_))
    }
}

impl From<JsonRpcRequest> for Call {
    fn from(request: JsonRpcRequest) -> Self {
        Call::Request(request)
    }
}

impl From<JsonRpcNotification> for Call {
    fn from(notification: JsonRpcNotification) -> Self {
        Call::Notification(notification)
    }
}

/// One decoded payload item: a valid call, or the validation error that
/// replaced it
pub type CallItem = Result<Call, RpcError>;

/// Ordered, non-empty sequence of decoded items in wire order
#[derive(Debug, Clone)]
pub struct BatchRequest {
    calls: Vec<CallItem>,
}

impl BatchRequest {
    /// Returns `None` for an empty list; an empty batch is a validation error
    /// upstream, never a value.
    pub fn new(calls: Vec<CallItem>) -> Option<Self> {
        if calls.is_empty() {
            None
        } else {
            Some(Self { calls })
        }
    }

    pub fn calls(&self) -> &[CallItem] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn into_calls(self) -> Vec<CallItem> {
        self.calls
    }
}

/// Outcome of decoding a payload: one unwrapped item, or a batch of several
#[derive(Debug, Clone)]
pub enum Deserialized {
    Single(CallItem),
    Batch(BatchRequest),
}

impl Deserialized {
    /// Flatten into wire-ordered items
    pub fn into_items(self) -> Vec<CallItem> {
        match self {
            Deserialized::Single(item) => vec![item],
            Deserialized::Batch(batch) => batch.into_calls(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_request_with_object_params() {
        let request = JsonRpcRequest::new(
            RequestId::String("req1".to_string()),
            "set_value",
            object(json!({"name": "test", "value": 42})).into(),
        );

        assert_eq!(request.get_param("name"), Some(&json!("test")));
        assert_eq!(request.get_param("value"), Some(&json!(42)));
        assert_eq!(request.get_param("missing"), None);
        assert_eq!(request.get_param_index(0), None);
    }

    #[test]
    fn test_request_with_array_params() {
        let request = JsonRpcRequest::new(
            RequestId::Number(2),
            "process",
            vec![json!("test"), json!(42), json!(true)].into(),
        );

        assert_eq!(request.get_param_index(0), Some(&json!("test")));
        assert_eq!(request.get_param_index(2), Some(&json!(true)));
        assert_eq!(request.get_param_index(3), None);
        assert_eq!(request.get_param("test"), None);
    }

    #[test]
    fn test_request_wire_form() {
        let request = JsonRpcRequest::new(RequestId::Number(1), "subtract", vec![json!(42)].into());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "subtract", "params": [42], "id": 1})
        );

        let legacy = request.with_version(JsonRpcVersion::V1_0);
        assert!(serde_json::to_value(&legacy).unwrap().get("jsonrpc").is_none());
    }

    #[test]
    fn test_params_parse_into_struct() {
        #[derive(Debug, Deserialize)]
        struct Subtract {
            minuend: i64,
            subtrahend: i64,
        }

        let params: RequestParams = object(json!({"minuend": 42, "subtrahend": 23})).into();
        let parsed: Subtract = params.parse().unwrap();
        assert_eq!(parsed.minuend - parsed.subtrahend, 19);

        let positional: RequestParams = vec![json!(1), json!(2)].into();
        let (a, b): (i64, i64) = positional.parse().unwrap();
        assert_eq!(a + b, 3);

        let wrong: RequestParams = object(json!({"minuend": "42"})).into();
        let err = wrong.parse::<Subtract>().unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::InvalidParams);
    }

    #[test]
    fn test_params_has_ignores_null() {
        let params: RequestParams = object(json!({"a": 1, "b": null})).into();
        assert!(params.has("a"));
        assert!(!params.has("b"));
        assert!(!params.has("c"));
        assert_eq!(params.len(), 2);
        assert!(RequestParams::default().is_empty());
    }

    #[test]
    fn test_batch_is_never_empty() {
        assert!(BatchRequest::new(vec![]).is_none());

        let batch = BatchRequest::new(vec![
            Ok(Call::Request(JsonRpcRequest::new_no_params(RequestId::Number(1), "a"))),
            Err(RpcError::invalid_request("Invalid Request")),
        ])
        .unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.calls()[1].is_err());
    }

    #[test]
    fn test_call_accessors() {
        let call: Call = JsonRpcNotification::new_no_params("ping").into();
        assert!(call.is_notification());
        assert_eq!(call.id(), None);
        assert_eq!(call.method(), "ping");

        let call: Call = JsonRpcRequest::new_no_params(RequestId::from("7"), "pong").into();
        assert!(!call.is_notification());
        assert_eq!(call.id(), Some(&RequestId::from("7")));
        assert_eq!(call.version(), JsonRpcVersion::V2_0);
    }
}
