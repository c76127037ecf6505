use serde::Serialize;
use serde_json::Value;

use crate::{request::RequestParams, types::JsonRpcVersion};

/// A JSON-RPC notification (a call without a correlation id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    #[serde(rename = "jsonrpc", skip_serializing_if = "JsonRpcVersion::is_v1")]
    pub version: JsonRpcVersion,
    pub method: String,
    pub params: RequestParams,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: RequestParams) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
        }
    }

    /// Create a new notification with no parameters
    pub fn new_no_params(method: impl Into<String>) -> Self {
        Self::new(method, RequestParams::default())
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
