//! Attempt routes: binds each attempt operation to a thunk run through
//! [`execute`].

use std::sync::Arc;

use attempt_api_core::{
    execute, operation_ids, ApiFailure, AttemptHandler, ExecutionOutcome, HandlerError,
    InternalOperationResult,
};
use tracing::error;

use crate::service::operation::{Operation, OperationResponse};
use crate::service::router::OperationRouter;

/// Builds the route table for the attempt resource.
///
/// `attempt.save_stats` is unsupported by this build: its thunk always
/// signals `NotImplemented` and the handler is never consulted.
#[must_use]
pub fn build_attempt_router(handler: Arc<dyn AttemptHandler>) -> OperationRouter {
    let mut router = OperationRouter::new();
    router.register(operation_ids::SAVE_STATS, save_stats);
    router.register(operation_ids::SET_WORKFLOW_IN_ATTEMPT, move |op| {
        set_workflow_in_attempt(&*handler, op)
    });
    router
}

fn save_stats(op: Operation) -> ExecutionOutcome<OperationResponse> {
    match op {
        Operation::SaveStats { .. } => execute(|| {
            Err::<InternalOperationResult, _>(HandlerError::not_implemented(
                operation_ids::SAVE_STATS,
            ))
        })
        .map(OperationResponse::Internal),
        other => Err(misrouted(operation_ids::SAVE_STATS, &other)),
    }
}

fn set_workflow_in_attempt(
    handler: &dyn AttemptHandler,
    op: Operation,
) -> ExecutionOutcome<OperationResponse> {
    match op {
        Operation::SetWorkflowInAttempt { payload, .. } => execute(|| {
            payload.validate()?;
            handler.set_workflow_in_attempt(&payload)
        })
        .map(OperationResponse::Internal),
        other => Err(misrouted(operation_ids::SET_WORKFLOW_IN_ATTEMPT, &other)),
    }
}

fn misrouted(route: &'static str, op: &Operation) -> ApiFailure {
    error!(
        route,
        operation = op.operation_id(),
        call_id = op.ctx().call_id,
        "operation delivered to the wrong route"
    );
    ApiFailure::unclassified()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use attempt_api_core::{
        AttemptStats, FailureKind, SaveStatsRequest, SetWorkflowInAttemptRequest,
    };

    use super::*;
    use crate::service::operation::OperationContext;

    type Script = fn() -> Result<InternalOperationResult, HandlerError>;

    /// Handler that counts calls and answers from a fixed script.
    struct ScriptedHandler {
        calls: AtomicU32,
        result: Script,
    }

    impl ScriptedHandler {
        fn new(result: Script) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                result,
            })
        }
    }

    impl AttemptHandler for ScriptedHandler {
        fn set_workflow_in_attempt(
            &self,
            _request: &SetWorkflowInAttemptRequest,
        ) -> Result<InternalOperationResult, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    /// Handler standing in for a collaborator that crashes.
    struct CrashingHandler;

    impl AttemptHandler for CrashingHandler {
        fn set_workflow_in_attempt(
            &self,
            _request: &SetWorkflowInAttemptRequest,
        ) -> Result<InternalOperationResult, HandlerError> {
            let record: Option<InternalOperationResult> = None;
            Ok(record.expect("attempt row loaded"))
        }
    }

    fn set_workflow(workflow_id: &str) -> Operation {
        Operation::SetWorkflowInAttempt {
            ctx: OperationContext::new(1),
            payload: SetWorkflowInAttemptRequest {
                job_id: 10,
                attempt_number: 1,
                workflow_id: workflow_id.to_string(),
                processing_task_queue: None,
            },
        }
    }

    fn save_stats_op() -> Operation {
        Operation::SaveStats {
            ctx: OperationContext::new(2),
            payload: SaveStatsRequest {
                job_id: 10,
                attempt_number: 1,
                stats: AttemptStats {
                    records_emitted: Some(100),
                    ..AttemptStats::default()
                },
                stream_stats: Vec::new(),
            },
        }
    }

    #[test]
    fn save_stats_is_not_implemented_and_skips_handler() {
        let handler = ScriptedHandler::new(|| Ok(InternalOperationResult::succeeded()));
        let router = build_attempt_router(handler.clone());

        let err = router.dispatch(save_stats_op()).unwrap_err();
        assert_eq!(err.kind, FailureKind::NotImplemented);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_workflow_returns_handler_result() {
        let handler = ScriptedHandler::new(|| Ok(InternalOperationResult::succeeded()));
        let router = build_attempt_router(handler.clone());

        let resp = router.dispatch(set_workflow("sync_10")).unwrap();
        assert_eq!(
            resp,
            OperationResponse::Internal(InternalOperationResult { succeeded: true })
        );
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_request_never_reaches_handler() {
        let handler = ScriptedHandler::new(|| Ok(InternalOperationResult::succeeded()));
        let router = build_attempt_router(handler.clone());

        let err = router.dispatch(set_workflow("")).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);
        assert_eq!(err.message, "workflowId must not be blank");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_dependency_failure_is_reported() {
        let handler = ScriptedHandler::new(|| {
            Err(HandlerError::dependency_failure("job store unavailable"))
        });
        let router = build_attempt_router(handler);

        let err = router.dispatch(set_workflow("sync_10")).unwrap_err();
        assert_eq!(err, ApiFailure::dependency_failure("job store unavailable"));
    }

    #[test]
    fn crashing_handler_is_unclassified() {
        let router = build_attempt_router(Arc::new(CrashingHandler));

        let err = router.dispatch(set_workflow("sync_10")).unwrap_err();
        assert_eq!(err, ApiFailure::unclassified());
    }

    #[test]
    fn wrong_variant_is_unclassified() {
        let err = save_stats(set_workflow("sync_10")).unwrap_err();
        assert_eq!(err, ApiFailure::unclassified());
    }
}
