//! In-process attempt handler backed by a `DashMap`.
//!
//! Holds only the workflow association of each attempt. Used by the
//! `attempt-server` binary and tests; deployments with real job storage
//! provide their own [`AttemptHandler`].

use attempt_api_core::{
    AttemptHandler, HandlerError, InternalOperationResult, SetWorkflowInAttemptRequest,
};
use dashmap::DashMap;
use tracing::info;

/// Workflow association of one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptRecord {
    pub workflow_id: Option<String>,
    pub processing_task_queue: Option<String>,
}

/// Attempts keyed by `(job_id, attempt_number)`.
#[derive(Debug, Default)]
pub struct InMemoryAttemptHandler {
    attempts: DashMap<(i64, i32), AttemptRecord>,
}

impl InMemoryAttemptHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an attempt known. Re-registering an attempt clears its workflow.
    pub fn register_attempt(&self, job_id: i64, attempt_number: i32) {
        self.attempts
            .insert((job_id, attempt_number), AttemptRecord::default());
    }

    #[must_use]
    pub fn attempt(&self, job_id: i64, attempt_number: i32) -> Option<AttemptRecord> {
        self.attempts
            .get(&(job_id, attempt_number))
            .map(|entry| entry.value().clone())
    }
}

impl AttemptHandler for InMemoryAttemptHandler {
    fn set_workflow_in_attempt(
        &self,
        request: &SetWorkflowInAttemptRequest,
    ) -> Result<InternalOperationResult, HandlerError> {
        let key = (request.job_id, request.attempt_number);
        let Some(mut record) = self.attempts.get_mut(&key) else {
            return Err(HandlerError::invalid_input(format!(
                "attempt {}/{} not found",
                request.job_id, request.attempt_number
            )));
        };

        record.workflow_id = Some(request.workflow_id.clone());
        record.processing_task_queue.clone_from(&request.processing_task_queue);

        info!(
            job_id = request.job_id,
            attempt_number = request.attempt_number,
            workflow_id = %request.workflow_id,
            "workflow recorded for attempt"
        );
        Ok(InternalOperationResult::succeeded())
    }
}
