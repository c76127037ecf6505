//! Method routing.
//!
//! Routes are registered on a [`RouterBuilder`] during startup and frozen into
//! an immutable [`Router`] which is then shared read-only between calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{RouteError, RpcError, ToRpcError};
use crate::handler::CallHandler;

/// Shared, type-erased handler stored in a route table
pub type SharedHandler<C, E> = Arc<dyn CallHandler<C, Error = E>>;

/// Mutable route table used while the application starts up
pub struct RouterBuilder<C, E = RpcError>
where
    C: Send + 'static,
    E: ToRpcError,
{
    routes: HashMap<String, SharedHandler<C, E>>,
}

impl<C, E> RouterBuilder<C, E>
where
    C: Send + 'static,
    E: ToRpcError,
{
    /// Create an empty route table
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a handler for `method`.
    ///
    /// Fails with `APPLICATION_ERROR` if the method is already registered.
    pub fn add<H>(&mut self, method: impl Into<String>, handler: H) -> Result<&mut Self, RpcError>
    where
        H: CallHandler<C, Error = E> + 'static,
    {
        self.add_shared(method, Arc::new(handler))
    }

    /// Register an already shared handler, e.g. one serving several methods
    pub fn add_shared(
        &mut self,
        method: impl Into<String>,
        handler: SharedHandler<C, E>,
    ) -> Result<&mut Self, RpcError> {
        let method = method.into();
        if self.routes.contains_key(&method) {
            return Err(RouteError::Duplicate(method).into());
        }
        debug!(method = %method, "registered JSON-RPC method");
        self.routes.insert(method, handler);
        Ok(self)
    }

    /// Consuming variant of [`add`](Self::add) for chained construction
    pub fn route<H>(mut self, method: impl Into<String>, handler: H) -> Result<Self, RpcError>
    where
        H: CallHandler<C, Error = E> + 'static,
    {
        self.add(method, handler)?;
        Ok(self)
    }

    /// Freeze the table
    pub fn build(self) -> Router<C, E> {
        Router {
            routes: self.routes,
        }
    }
}

impl<C, E> Default for RouterBuilder<C, E>
where
    C: Send + 'static,
    E: ToRpcError,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable method table. Lookups are pure reads and safe to run
/// concurrently.
pub struct Router<C, E = RpcError>
where
    C: Send + 'static,
    E: ToRpcError,
{
    routes: HashMap<String, SharedHandler<C, E>>,
}

impl<C, E> Router<C, E>
where
    C: Send + 'static,
    E: ToRpcError,
{
    /// Start a new route table
    pub fn builder() -> RouterBuilder<C, E> {
        RouterBuilder::new()
    }

    /// Look up the handler for `method`; fails with `METHOD_NOT_FOUND`
    pub fn run(&self, method: &str) -> Result<&SharedHandler<C, E>, RpcError> {
        self.routes.get(method).ok_or_else(RpcError::method_not_found)
    }

    /// Check if a method is registered
    pub fn contains(&self, method: &str) -> bool {
        self.routes.contains_key(method)
    }

    /// Registered method names, sorted
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<C, E> fmt::Debug for Router<C, E>
where
    C: Send + 'static,
    E: ToRpcError,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods())
            .finish()
    }
}
