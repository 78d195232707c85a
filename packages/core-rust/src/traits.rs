use std::sync::Arc;

use crate::error::HandlerError;
use crate::types::{InternalOperationResult, SetWorkflowInAttemptRequest};

/// Business logic behind the attempt operations.
///
/// One method per supported operation. Implementations are called from a
/// blocking context and may perform blocking I/O. Retries and idempotence
/// are the implementation's concern; callers invoke each method at most once
/// per request.
pub trait AttemptHandler: Send + Sync {
    /// Records which workflow (and task queue) is executing the attempt.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a malformed request or unknown attempt,
    /// `DependencyFailure` when the backing store cannot be updated.
    fn set_workflow_in_attempt(
        &self,
        request: &SetWorkflowInAttemptRequest,
    ) -> Result<InternalOperationResult, HandlerError>;
}

impl<T: AttemptHandler + ?Sized> AttemptHandler for Arc<T> {
    fn set_workflow_in_attempt(
        &self,
        request: &SetWorkflowInAttemptRequest,
    ) -> Result<InternalOperationResult, HandlerError> {
        (**self).set_workflow_in_attempt(request)
    }
}
