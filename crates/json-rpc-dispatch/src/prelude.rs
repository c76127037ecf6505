//! # JSON-RPC Dispatch Prelude
//!
//! Convenient re-exports of the types most handler authors need.
//!
//! ```rust
//! use json_rpc_dispatch::prelude::*;
//! ```

pub use crate::config::HandlerConfig;
pub use crate::dispatch::JsonRequestHandler;
pub use crate::error::{ErrorCode, RpcError, ToRpcError};
pub use crate::handler::{CallHandler, ContextFactory, FunctionHandler};
pub use crate::notification::JsonRpcNotification;
pub use crate::request::{Call, JsonRpcRequest, RequestParams};
pub use crate::response::JsonRpcMessage;
pub use crate::router::{Router, RouterBuilder};
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
