use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::HandlerError;

/// Allowed characters for a processing task queue name.
static TASK_QUEUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("task queue pattern compiles"));

/// Record and byte counters for one attempt or one stream within it.
///
/// Every counter is optional: sources report only what they track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub records_emitted: Option<i64>,
    pub bytes_emitted: Option<i64>,
    pub estimated_records: Option<i64>,
    pub estimated_bytes: Option<i64>,
    pub records_committed: Option<i64>,
}

impl AttemptStats {
    fn counters(&self) -> [(&'static str, Option<i64>); 5] {
        [
            ("recordsEmitted", self.records_emitted),
            ("bytesEmitted", self.bytes_emitted),
            ("estimatedRecords", self.estimated_records),
            ("estimatedBytes", self.estimated_bytes),
            ("recordsCommitted", self.records_committed),
        ]
    }

    fn validate(&self, scope: &str) -> Result<(), HandlerError> {
        for (name, value) in self.counters() {
            if let Some(v) = value {
                if v < 0 {
                    return Err(HandlerError::invalid_input(format!(
                        "{scope}.{name} must not be negative, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-stream statistics reported alongside the attempt totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub stream_name: String,
    #[serde(default)]
    pub stream_namespace: Option<String>,
    pub stats: AttemptStats,
}

/// Request body for `attempt.save_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatsRequest {
    pub job_id: i64,
    pub attempt_number: i32,
    pub stats: AttemptStats,
    #[serde(default)]
    pub stream_stats: Vec<StreamStats>,
}

impl SaveStatsRequest {
    /// Checks identifiers and counters.
    ///
    /// The `attempt.save_stats` route does not call this: the operation is
    /// unsupported and rejects every request. It is here for a handler that
    /// records stats, which must run it before touching storage.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), HandlerError> {
        validate_attempt_key(self.job_id, self.attempt_number)?;
        self.stats.validate("stats")?;
        for stream in &self.stream_stats {
            if stream.stream_name.trim().is_empty() {
                return Err(HandlerError::invalid_input("streamName must not be blank"));
            }
            stream
                .stats
                .validate(&format!("streamStats[{}]", stream.stream_name))?;
        }
        Ok(())
    }
}

/// Request body for `attempt.set_workflow_in_attempt`.
///
/// Associates a running attempt with the workflow executing it and,
/// optionally, the task queue that workflow was dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetWorkflowInAttemptRequest {
    pub job_id: i64,
    pub attempt_number: i32,
    pub workflow_id: String,
    #[serde(default)]
    pub processing_task_queue: Option<String>,
}

impl SetWorkflowInAttemptRequest {
    /// Checks identifiers, the workflow id and the task queue name.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError::InvalidInput` naming the first offending field.
    pub fn validate(&self) -> Result<(), HandlerError> {
        validate_attempt_key(self.job_id, self.attempt_number)?;
        if self.workflow_id.trim().is_empty() {
            return Err(HandlerError::invalid_input("workflowId must not be blank"));
        }
        if let Some(queue) = &self.processing_task_queue {
            if !TASK_QUEUE_PATTERN.is_match(queue) {
                return Err(HandlerError::invalid_input(format!(
                    "processingTaskQueue contains invalid characters: {queue:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Outcome marker returned by internal (worker-facing) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalOperationResult {
    pub succeeded: bool,
}

impl InternalOperationResult {
    #[must_use]
    pub fn succeeded() -> Self {
        Self { succeeded: true }
    }
}

fn validate_attempt_key(job_id: i64, attempt_number: i32) -> Result<(), HandlerError> {
    if job_id < 0 {
        return Err(HandlerError::invalid_input(format!(
            "jobId must not be negative, got {job_id}"
        )));
    }
    if attempt_number < 0 {
        return Err(HandlerError::invalid_input(format!(
            "attemptNumber must not be negative, got {attempt_number}"
        )));
    }
    Ok(())
}
