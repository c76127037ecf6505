use crate::serializer::{BASE_DEPTH, MAX_DEPTH};

/// Configuration for [`JsonRequestHandler`](crate::JsonRequestHandler)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Extra nesting levels allowed inside `params`, on top of the base depth
    /// of a batch of call objects. The total never exceeds
    /// [`MAX_DEPTH`](crate::serializer::MAX_DEPTH).
    pub params_depth: usize,
    /// Run the calls of a batch concurrently. Responses keep wire order.
    pub concurrent_batches: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            params_depth: 1,
            concurrent_batches: false,
        }
    }
}

impl HandlerConfig {
    /// Set the params nesting allowance, capped at
    /// `MAX_DEPTH - BASE_DEPTH`
    pub fn with_params_depth(mut self, params_depth: usize) -> Self {
        self.params_depth = params_depth.min(MAX_DEPTH - BASE_DEPTH);
        self
    }

    /// Run batch items concurrently (responses keep wire order)
    pub fn with_concurrent_batches(mut self, enabled: bool) -> Self {
        self.concurrent_batches = enabled;
        self
    }
}
