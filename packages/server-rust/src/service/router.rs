//! Operation routing: an explicit route table from operation id to route function.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use attempt_api_core::{ApiFailure, ExecutionOutcome};
use tokio::task::JoinError;
use tower::Service;
use tracing::{error, warn};

use super::operation::{Operation, OperationResponse};

// ---------------------------------------------------------------------------
// RouteFn
// ---------------------------------------------------------------------------

/// A synchronous route: takes ownership of the operation and returns its outcome.
type RouteFn = Box<dyn Fn(Operation) -> ExecutionOutcome<OperationResponse> + Send + Sync>;

type BoxedFuture =
    Pin<Box<dyn Future<Output = Result<OperationResponse, ApiFailure>> + Send>>;

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes `Operation` values to the route registered for their operation id.
///
/// The table is filled once at startup and never mutated afterwards; share
/// it behind an `Arc`. Operations without a registered route fail with
/// `not_implemented`.
pub struct OperationRouter {
    routes: HashMap<&'static str, RouteFn>,
}

impl OperationRouter {
    /// Create a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register the route for `operation_id`, replacing any previous one.
    pub fn register<F>(&mut self, operation_id: &'static str, route: F)
    where
        F: Fn(Operation) -> ExecutionOutcome<OperationResponse> + Send + Sync + 'static,
    {
        self.routes.insert(operation_id, Box::new(route));
    }

    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.routes.contains_key(operation_id)
    }

    /// Runs the route for `op` on the current thread.
    ///
    /// # Errors
    ///
    /// Returns the route's failure, or `not_implemented` when no route exists.
    pub fn dispatch(&self, op: Operation) -> ExecutionOutcome<OperationResponse> {
        let operation_id = op.operation_id();
        match self.routes.get(operation_id) {
            Some(route) => route(op),
            None => {
                warn!(operation = operation_id, "no route registered");
                Err(ApiFailure::not_implemented(operation_id))
            }
        }
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatches on the blocking thread pool so handlers may block.
///
/// The operation's in-flight guard moves into the blocking task, so a caller
/// that gives up (timeout, disconnect) does not end the in-flight count early.
impl Service<Operation> for Arc<OperationRouter> {
    type Response = OperationResponse;
    type Error = ApiFailure;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut op: Operation) -> Self::Future {
        let router = Arc::clone(self);
        let operation_id = op.operation_id();
        let in_flight = op.ctx_mut().in_flight.take();
        Box::pin(async move {
            let task = tokio::task::spawn_blocking(move || {
                let _in_flight = in_flight;
                router.dispatch(op)
            });
            match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(join_failure(operation_id, &join_err)),
            }
        })
    }
}

fn join_failure(operation_id: &'static str, err: &JoinError) -> ApiFailure {
    if err.is_cancelled() {
        warn!(operation = operation_id, "operation was cancelled");
        ApiFailure::dependency_failure("operation was cancelled")
    } else {
        error!(operation = operation_id, error = %err, "route panicked");
        ApiFailure::unclassified()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
