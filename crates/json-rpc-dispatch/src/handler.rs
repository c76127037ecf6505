use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToRpcError;
use crate::request::Call;

/// Trait for handling a routed JSON-RPC call
#[async_trait]
pub trait CallHandler<C>: Send + Sync
where
    C: Send + 'static,
{
    /// The error type returned by this handler
    type Error: ToRpcError;

    /// Handle one call with a context created for it alone.
    /// Returns domain errors only; the dispatcher converts them into
    /// protocol errors (or drops them for notifications).
    async fn handle(&self, context: C, call: &Call) -> Result<Value, Self::Error>;
}

/// Factory for the per-call execution context
pub trait ContextFactory: Send + Sync {
    type Context: Send + 'static;

    /// Invoked once per dispatched call
    fn create_context(&self) -> Self::Context;
}

impl<F, C> ContextFactory for F
where
    F: Fn() -> C + Send + Sync,
    C: Send + 'static,
{
    type Context = C;

    fn create_context(&self) -> C {
        self()
    }
}

/// A closure-based handler
pub struct FunctionHandler<F, C, Fut, E> {
    handler_fn: F,
    _marker: PhantomData<fn(C) -> (Fut, E)>,
}

impl<F, C, Fut, E> FunctionHandler<F, C, Fut, E>
where
    F: Fn(C, Call) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, E>> + Send,
{
    pub fn new(handler_fn: F) -> Self {
        Self {
            handler_fn,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<F, C, Fut, E> CallHandler<C> for FunctionHandler<F, C, Fut, E>
where
    F: Fn(C, Call) -> Fut + Send + Sync + 'static,
    C: Send + 'static,
    Fut: Future<Output = Result<Value, E>> + Send + 'static,
    E: ToRpcError,
{
    type Error = E;

    async fn handle(&self, context: C, call: &Call) -> Result<Value, Self::Error> {
        (self.handler_fn)(context, call.clone()).await
    }
}
