//! Attempt API core: request/result types, the handler capability, and the
//! execution wrapper that classifies every operation outcome.

pub mod error;
pub mod execute;
pub mod traits;
pub mod types;

pub use error::{ApiFailure, FailureKind, HandlerError, UNCLASSIFIED_MESSAGE};
pub use execute::{execute, ExecutionOutcome};
pub use traits::AttemptHandler;
pub use types::{
    AttemptStats, InternalOperationResult, SaveStatsRequest, SetWorkflowInAttemptRequest,
    StreamStats,
};

/// Operation identifiers used as route-table keys.
pub mod operation_ids {
    pub const SAVE_STATS: &str = "attempt.save_stats";
    pub const SET_WORKFLOW_IN_ATTEMPT: &str = "attempt.set_workflow_in_attempt";
}
