//! # JSON-RPC 1.0/2.0 Dispatch
//!
//! A transport-agnostic JSON-RPC implementation that turns a raw payload into
//! validated calls, routes each call to a registered handler and serializes the
//! outcomes back into a compliant response body.
//!
//! ## Features
//! - JSON-RPC 1.0 and 2.0 version disambiguation
//! - Batches with per-item error isolation, responses in wire order
//! - Notifications never produce a response, not even an error
//! - Single-vs-batch collapse on both the request and the response side
//! - Bounded nesting depth for incoming payloads
//!
//! ```rust
//! use json_rpc_dispatch::prelude::*;
//! use serde_json::{json, Value};
//!
//! # futures::executor::block_on(async {
//! let mut router: RouterBuilder<()> = Router::builder();
//! router
//!     .add(
//!         "ping",
//!         FunctionHandler::new(|_ctx: (), _call: Call| async { Ok::<Value, RpcError>(json!("pong")) }),
//!     )
//!     .unwrap();
//!
//! let handler = JsonRequestHandler::new(router.build(), || ());
//! let body = handler
//!     .handle(br#"{"jsonrpc":"2.0","method":"ping","id":1}"#)
//!     .await;
//! assert_eq!(body, r#"{"jsonrpc":"2.0","result":"pong","id":1}"#);
//! # });
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod notification;
pub mod prelude;
pub mod request;
pub mod response;
pub mod router;
pub mod serializer;
pub mod types;

// Re-export main types
pub use config::HandlerConfig;
pub use dispatch::JsonRequestHandler;
pub use error::{ErrorCode, RpcError, ToRpcError};
pub use handler::{CallHandler, ContextFactory, FunctionHandler};
pub use notification::JsonRpcNotification;
pub use request::{BatchRequest, Call, Deserialized, JsonRpcRequest, RequestParams};
pub use response::{ErrorObject, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcResponse};
pub use router::{Router, RouterBuilder};
pub use serializer::JsonSerializer;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Content type the transport binding should send with every response body
pub const CONTENT_TYPE: &str = "application/rpc+json";

/// Protocol error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const PARSE_ENCODING_ERROR: i32 = -32701;
    pub const PARSE_CHARACTER_ENCODING_ERROR: i32 = -32702;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const APPLICATION_ERROR: i32 = -32500;
    pub const SYSTEM_ERROR: i32 = -32400;
    pub const TRANSPORT_ERROR: i32 = -32300;

    // Implementation-defined server error used when a response set cannot be encoded
    pub const SERIALIZATION_ERROR: i32 = -32099;
}
