//! Pipeline composition: wraps the route table in the operation middleware.

use std::sync::Arc;

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use crate::service::router::OperationRouter;

/// The composed operation service. Cheap to clone: the router is shared.
pub type OperationPipeline = MetricsService<Arc<OperationRouter>>;

/// Build the operation pipeline by wrapping the `OperationRouter` with middleware layers.
///
/// Only `MetricsLayer` is applied. Request timeouts are enforced by the HTTP
/// middleware; operations themselves are never retried or timed out here.
#[must_use]
pub fn build_operation_pipeline(router: OperationRouter) -> OperationPipeline {
    ServiceBuilder::new()
        .layer(MetricsLayer)
        .service(Arc::new(router))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use attempt_api_core::{operation_ids, FailureKind, SetWorkflowInAttemptRequest};
    use tower::ServiceExt;

    use super::*;
    use crate::service::domain::{build_attempt_router, InMemoryAttemptHandler};
    use crate::service::operation::{Operation, OperationContext, OperationResponse};

    fn set_workflow_op(attempt_number: i32) -> Operation {
        Operation::SetWorkflowInAttempt {
            ctx: OperationContext::new(7),
            payload: SetWorkflowInAttemptRequest {
                job_id: 3,
                attempt_number,
                workflow_id: "sync_3".to_string(),
                processing_task_queue: None,
            },
        }
    }

    #[tokio::test]
    async fn pipeline_routes_through_all_layers() {
        let handler = Arc::new(InMemoryAttemptHandler::new());
        handler.register_attempt(3, 0);
        let pipeline = build_operation_pipeline(build_attempt_router(handler.clone()));

        let resp = pipeline.clone().oneshot(set_workflow_op(0)).await.unwrap();
        assert!(matches!(resp, OperationResponse::Internal(r) if r.succeeded));
        assert_eq!(
            handler.attempt(3, 0).unwrap().workflow_id.as_deref(),
            Some("sync_3")
        );

        let err = pipeline.oneshot(set_workflow_op(4)).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidInput);
    }

    #[tokio::test]
    async fn empty_router_reports_not_implemented() {
        let pipeline = build_operation_pipeline(OperationRouter::new());

        let err = pipeline.oneshot(set_workflow_op(0)).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::NotImplemented);
        assert_eq!(
            err.message,
            format!("operation not implemented: {}", operation_ids::SET_WORKFLOW_IN_ATTEMPT)
        );
    }
}
