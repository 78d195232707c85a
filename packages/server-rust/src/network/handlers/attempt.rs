//! Attempt endpoints: `POST /api/v1/attempt/{save_stats,set_workflow_in_attempt}`.
//!
//! Each handler builds an `Operation` and sends it through the operation
//! pipeline; failures come back already classified and are rendered by
//! [`ErrorResponse`]. Bodies that do not decode are rejected here as
//! `invalid_input`, in the same JSON shape.

use attempt_api_core::{
    operation_ids, ApiFailure, FailureKind, InternalOperationResult, SaveStatsRequest,
    SetWorkflowInAttemptRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tower::ServiceExt;
use tracing::debug;

use super::{AppState, ErrorResponse};
use crate::network::middleware::REQUEST_ID_HEADER;
use crate::service::{Operation, OperationContext, OperationResponse};

type Body<T> = Result<Json<T>, JsonRejection>;

pub async fn save_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body<SaveStatsRequest>,
) -> Result<Json<InternalOperationResult>, ErrorResponse> {
    let payload = decode(operation_ids::SAVE_STATS, body)?;
    dispatch(&state, &headers, |ctx| Operation::SaveStats { ctx, payload }).await
}

pub async fn set_workflow_in_attempt_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body<SetWorkflowInAttemptRequest>,
) -> Result<Json<InternalOperationResult>, ErrorResponse> {
    let payload = decode(operation_ids::SET_WORKFLOW_IN_ATTEMPT, body)?;
    dispatch(&state, &headers, |ctx| Operation::SetWorkflowInAttempt {
        ctx,
        payload,
    })
    .await
}

/// Unwraps the request body or turns the extractor's rejection into an
/// `invalid_input` failure.
fn decode<T>(operation: &'static str, body: Body<T>) -> Result<T, ErrorResponse> {
    body.map(|Json(payload)| payload).map_err(|rejection| {
        debug!(operation, status = %rejection.status(), "request body rejected");
        let message = match rejection {
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "expected `Content-Type: application/json`".to_string()
            }
            other => other.body_text(),
        };
        ErrorResponse::new(
            operation,
            ApiFailure::new(FailureKind::InvalidInput, message),
            None,
        )
    })
}

async fn dispatch(
    state: &AppState,
    headers: &HeaderMap,
    build: impl FnOnce(OperationContext) -> Operation,
) -> Result<Json<InternalOperationResult>, ErrorResponse> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ctx = OperationContext::new(state.next_call_id())
        .with_request_id(request_id)
        .with_in_flight(state.shutdown.in_flight_guard());
    let op = build(ctx);
    let operation = op.operation_id();

    match state.pipeline.clone().oneshot(op).await {
        Ok(OperationResponse::Internal(result)) => Ok(Json(result)),
        Err(failure) => Err(ErrorResponse::new(
            operation,
            failure,
            state.server_config.availability(operation),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attempt_api_core::AttemptStats;
    use axum::http::StatusCode;

    use super::*;
    use crate::network::ShutdownController;
    use crate::service::{
        build_attempt_router, build_operation_pipeline, InMemoryAttemptHandler, ServerConfig,
    };

    fn test_state(handler: Arc<InMemoryAttemptHandler>) -> AppState {
        AppState::new(
            build_operation_pipeline(build_attempt_router(handler)),
            Arc::new(ServerConfig::default()),
            Arc::new(ShutdownController::new()),
        )
    }

    #[tokio::test]
    async fn save_stats_reports_not_implemented() {
        let state = test_state(Arc::new(InMemoryAttemptHandler::new()));
        let payload = SaveStatsRequest {
            job_id: 1,
            attempt_number: 0,
            stats: AttemptStats::default(),
            stream_stats: Vec::new(),
        };

        let err = save_stats_handler(State(state), HeaderMap::new(), Ok(Json(payload)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(err.body.kind, FailureKind::NotImplemented);
        assert_eq!(err.body.permanent, Some(true));
    }

    #[tokio::test]
    async fn set_workflow_succeeds_and_releases_in_flight_guard() {
        let handler = Arc::new(InMemoryAttemptHandler::new());
        handler.register_attempt(2, 1);
        let state = test_state(handler.clone());
        let payload = SetWorkflowInAttemptRequest {
            job_id: 2,
            attempt_number: 1,
            workflow_id: "sync_2".to_string(),
            processing_task_queue: Some("SYNC".to_string()),
        };

        let Json(result) = set_workflow_in_attempt_handler(
            State(state.clone()),
            HeaderMap::new(),
            Ok(Json(payload)),
        )
        .await
        .unwrap();
        assert!(result.succeeded);
        assert_eq!(state.shutdown.in_flight_count(), 0);
        assert_eq!(
            handler.attempt(2, 1).unwrap().processing_task_queue.as_deref(),
            Some("SYNC")
        );
    }

    #[tokio::test]
    async fn call_ids_are_unique() {
        let state = test_state(Arc::new(InMemoryAttemptHandler::new()));
        let first = state.next_call_id();
        let second = state.clone().next_call_id();
        assert_ne!(first, second);
    }
}
