//! # Dispatch Orchestrator
//!
//! [`JsonRequestHandler`] drives one payload through the whole pipeline:
//! decode, route every call, collect the outcomes, encode the body.
//!
//! Error isolation follows the shape of the failure:
//! - payload-level failures (bad JSON, wrong top-level shape) produce a single
//!   error response and nothing else
//! - a malformed batch element produces an error response in its own slot
//! - a handler failure becomes that request's error response, and is dropped
//!   entirely for notifications

use futures::future::join_all;
use tracing::{debug, trace};

use crate::config::HandlerConfig;
use crate::error::{ErrorCode, RpcError, ToRpcError};
use crate::handler::ContextFactory;
use crate::request::{Call, CallItem};
use crate::response::JsonRpcMessage;
use crate::router::Router;
use crate::serializer::JsonSerializer;

/// Transport-agnostic JSON-RPC request handler
pub struct JsonRequestHandler<F, E = RpcError>
where
    F: ContextFactory,
    E: ToRpcError,
{
    router: Router<F::Context, E>,
    context_factory: F,
    config: HandlerConfig,
}

impl<F, E> JsonRequestHandler<F, E>
where
    F: ContextFactory,
    E: ToRpcError,
{
    /// Create a handler with the default [`HandlerConfig`]
    pub fn new(router: Router<F::Context, E>, context_factory: F) -> Self {
        Self::with_config(router, context_factory, HandlerConfig::default())
    }

    /// Create a handler with an explicit configuration
    pub fn with_config(
        router: Router<F::Context, E>,
        context_factory: F,
        config: HandlerConfig,
    ) -> Self {
        Self {
            router,
            context_factory,
            config,
        }
    }

    /// The frozen method table
    pub fn router(&self) -> &Router<F::Context, E> {
        &self.router
    }

    /// Active configuration
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Process one raw payload and return the body to send back.
    ///
    /// An empty string means no body must be sent (only notifications were
    /// received). Never fails: every problem is reported inside the body.
    pub async fn handle(&self, body: &[u8]) -> String {
        debug!(bytes = body.len(), "handling JSON-RPC payload");

        let mut responses = Vec::new();
        let calls: Vec<CallItem> =
            match JsonSerializer::deserialize_calls(body, self.config.params_depth) {
                Ok(deserialized) => deserialized.into_items(),
                Err(err) => {
                    debug!(code = err.code().code(), error = %err, "rejecting JSON-RPC payload");
                    responses.push(JsonRpcMessage::error(err.correlation_id().cloned(), &err));
                    Vec::new()
                }
            };
        let received = calls.len();

        if self.config.concurrent_batches && received > 1 {
            let outcomes = join_all(calls.into_iter().map(|item| self.dispatch_item(item))).await;
            responses.extend(outcomes.into_iter().flatten());
        } else {
            for item in calls {
                if let Some(response) = self.dispatch_item(item).await {
                    responses.push(response);
                }
            }
        }

        if received == 0 && responses.is_empty() {
            let err = RpcError::new(
                ErrorCode::ParseError,
                "Parse Error: Expected call to contain Requests.",
            );
            responses.push(JsonRpcMessage::error(None, &err));
        }

        debug!(
            calls = received,
            responses = responses.len(),
            "JSON-RPC payload handled"
        );
        JsonSerializer::serialize_responses(&responses)
    }

    /// Convenience wrapper over [`handle`](Self::handle) for text payloads
    pub async fn handle_str(&self, body: &str) -> String {
        self.handle(body.as_bytes()).await
    }

    /// Dispatch one validated call to its handler.
    ///
    /// Returns `None` for notifications whatever the outcome, otherwise the
    /// result or error response correlated with the request id.
    pub async fn handle_call(&self, call: &Call) -> Option<JsonRpcMessage> {
        let context = self.context_factory.create_context();

        let outcome = match self.router.run(call.method()) {
            Ok(handler) => handler
                .handle(context, call)
                .await
                .map_err(|err| err.to_rpc_error()),
            Err(err) => Err(err),
        };

        match call {
            Call::Notification(notification) => {
                if let Err(err) = outcome {
                    debug!(
                        method = %notification.method,
                        error = %err,
                        "suppressing error for JSON-RPC notification"
                    );
                }
                None
            }
            Call::Request(request) => Some(match outcome {
                Ok(result) => {
                    trace!(method = %request.method, "JSON-RPC request succeeded");
                    JsonRpcMessage::success(request.id.clone(), result)
                }
                Err(err) => {
                    debug!(
                        method = %request.method,
                        code = err.code().code(),
                        error = %err,
                        "JSON-RPC request failed"
                    );
                    JsonRpcMessage::error(request.id.clone(), &err)
                }
            }),
        }
    }

    async fn dispatch_item(&self, item: CallItem) -> Option<JsonRpcMessage> {
        match item {
            Ok(call) => self.handle_call(&call).await,
            Err(err) => Some(JsonRpcMessage::error(err.correlation_id().cloned(), &err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CallHandler;
    use crate::router::RouterBuilder;
    use crate::{JsonRpcNotification, JsonRpcRequest, RequestId};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Subtract;

    #[async_trait]
    impl CallHandler<()> for Subtract {
        type Error = RpcError;

        async fn handle(&self, _context: (), call: &Call) -> Result<Value, RpcError> {
            let params = call.params();
            let minuend = params.get("minuend").and_then(Value::as_i64);
            let subtrahend = params.get("subtrahend").and_then(Value::as_i64);
            match (minuend, subtrahend) {
                (Some(m), Some(s)) => Ok(json!(m - s)),
                _ => Err(RpcError::invalid_params("Invalid params")),
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Throwing Task")]
    struct Throwing;

    impl ToRpcError for Throwing {}

    struct ThrowingTask;

    #[async_trait]
    impl CallHandler<()> for ThrowingTask {
        type Error = RpcError;

        async fn handle(&self, _context: (), _call: &Call) -> Result<Value, RpcError> {
            Err(Throwing.to_rpc_error())
        }
    }

    fn handler(routes: RouterBuilder<()>) -> JsonRequestHandler<impl ContextFactory<Context = ()>> {
        JsonRequestHandler::new(routes.build(), || ())
    }

    fn subtract_params() -> crate::RequestParams {
        match json!({"subtrahend": 23, "minuend": 42}) {
            Value::Object(map) => map.into(),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_notification_call_returns_nothing() {
        let handler = handler(RouterBuilder::new().route("subtract", Subtract).unwrap());
        let call: Call = JsonRpcNotification::new("subtract", subtract_params()).into();

        assert!(handler.handle_call(&call).await.is_none());
    }

    #[tokio::test]
    async fn test_request_call_returns_response() {
        let handler = handler(RouterBuilder::new().route("subtract", Subtract).unwrap());
        let call: Call = JsonRpcRequest::new(RequestId::Number(1), "subtract", subtract_params()).into();

        let response = handler.handle_call(&call).await.unwrap();
        assert!(!response.is_error());
        assert_eq!(response.id(), Some(&RequestId::Number(1)));
        assert_eq!(response, JsonRpcMessage::success(Some(RequestId::Number(1)), json!(19)));
    }

    #[tokio::test]
    async fn test_throwing_task_returns_error_response() {
        let handler = handler(RouterBuilder::new().route("subtract", ThrowingTask).unwrap());
        let call: Call = JsonRpcRequest::new(RequestId::Number(1), "subtract", subtract_params()).into();

        let response = handler.handle_call(&call).await.unwrap();
        assert!(response.is_error());
        assert_eq!(response.id(), Some(&RequestId::Number(1)));
        let JsonRpcMessage::Error(error) = response else {
            panic!("expected error response");
        };
        assert_eq!(error.error.code, -32500);
        assert_eq!(error.error.message, "Throwing Task");
    }

    #[tokio::test]
    async fn test_failing_notification_is_suppressed() {
        let handler = handler(RouterBuilder::new().route("subtract", ThrowingTask).unwrap());

        let failing: Call = JsonRpcNotification::new_no_params("subtract").into();
        assert!(handler.handle_call(&failing).await.is_none());

        let unknown: Call = JsonRpcNotification::new_no_params("missing").into();
        assert!(handler.handle_call(&unknown).await.is_none());
        assert_eq!(handler.handle(br#"{"jsonrpc":"2.0","method":"missing"}"#).await, "");
    }

    #[tokio::test]
    async fn test_handler_declared_code_is_kept() {
        let handler = handler(RouterBuilder::new().route("subtract", Subtract).unwrap());
        let body = handler
            .handle(br#"{"jsonrpc":"2.0","method":"subtract","params":[1,2],"id":"a"}"#)
            .await;
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"},"id":"a"}"#
        );
    }

    #[tokio::test]
    async fn test_null_id_request_gets_null_id_response() {
        let handler = handler(RouterBuilder::new().route("subtract", Subtract).unwrap());
        let body = handler
            .handle(br#"{"jsonrpc":"2.0","method":"subtract","params":{"minuend":5,"subtrahend":2},"id":null}"#)
            .await;
        assert_eq!(body, r#"{"jsonrpc":"2.0","result":3,"id":null}"#);
    }

    #[tokio::test]
    async fn test_fresh_context_per_call() {
        struct Echo;

        #[async_trait]
        impl CallHandler<usize> for Echo {
            type Error = RpcError;

            async fn handle(&self, context: usize, _call: &Call) -> Result<Value, RpcError> {
                Ok(json!(context))
            }
        }

        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let router: Router<usize> = RouterBuilder::new().route("echo", Echo).unwrap().build();
        let handler = JsonRequestHandler::new(router, move || counter.fetch_add(1, Ordering::SeqCst));

        let body = handler
            .handle(br#"[{"jsonrpc":"2.0","method":"echo","id":1},{"jsonrpc":"2.0","method":"echo"},{"jsonrpc":"2.0","method":"echo","id":2}]"#)
            .await;
        assert_eq!(
            body,
            r#"[{"jsonrpc":"2.0","result":0,"id":1},{"jsonrpc":"2.0","result":2,"id":2}]"#
        );
        assert_eq!(created.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concurrent_batches_keep_wire_order() {
        struct Sleepy;

        #[async_trait]
        impl CallHandler<()> for Sleepy {
            type Error = RpcError;

            async fn handle(&self, _context: (), call: &Call) -> Result<Value, RpcError> {
                let delay = call.params().get_index(0).and_then(Value::as_u64).unwrap_or(0);
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                Ok(json!(delay))
            }
        }

        let router: Router<()> = RouterBuilder::new().route("sleep", Sleepy).unwrap().build();
        let config = HandlerConfig::default().with_concurrent_batches(true);
        let handler = JsonRequestHandler::with_config(router, || (), config);

        let body = handler
            .handle(br#"[{"method":"sleep","params":[30],"id":1},{"method":"sleep","params":[1],"id":2},{"method":"nope","id":3}]"#)
            .await;
        assert_eq!(
            body,
            concat!(
                r#"[{"jsonrpc":"2.0","result":30,"id":1},"#,
                r#"{"jsonrpc":"2.0","result":1,"id":2},"#,
                r#"{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":3}]"#
            )
        );
    }

    #[tokio::test]
    async fn test_payload_error_has_null_id() {
        let handler = handler(RouterBuilder::new());
        let body = handler.handle(b"42").await;
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request: Expected Request object or array of Request objects."},"id":null}"#
        );
    }

    #[tokio::test]
    async fn test_params_depth_is_configurable() {
        let router: Router<()> = RouterBuilder::new().route("subtract", Subtract).unwrap().build();
        let strict = JsonRequestHandler::with_config(
            router,
            || (),
            HandlerConfig::default().with_params_depth(0),
        );

        let body = strict
            .handle(br#"{"jsonrpc":"2.0","method":"subtract","params":{"minuend":[[[1]]]},"id":1}"#)
            .await;
        assert_eq!(
            body,
            r#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request: Exceeded maximum parameter depth."},"id":null}"#
        );
    }
}
