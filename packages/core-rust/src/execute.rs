//! Execution wrapper: the single entry point every API operation runs through.
//!
//! [`execute`] invokes a thunk exactly once and normalizes whatever happens
//! into an [`ExecutionOutcome`]. Handler errors keep their classification;
//! any other error, and any panic, becomes a generic
//! [`FailureKind::DependencyFailure`](crate::FailureKind::DependencyFailure).

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::error::{ApiFailure, FailureKind, HandlerError};

/// Normalized result of one invocation.
pub type ExecutionOutcome<R> = Result<R, ApiFailure>;

/// Runs `op` synchronously and classifies its outcome.
///
/// - `Ok(value)` is returned unchanged.
/// - An error whose chain contains a [`HandlerError`] becomes an
///   [`ApiFailure`] of the same kind and message.
/// - Any other error, or a panic, becomes [`ApiFailure::unclassified`]. The
///   original error is logged, never returned.
///
/// No retries: the thunk is called at most once.
pub fn execute<R, E, F>(op: F) -> ExecutionOutcome<R>
where
    F: FnOnce() -> Result<R, E>,
    E: Into<anyhow::Error>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(classify(&err.into())),
        Err(payload) => {
            error!(panic = panic_message(payload.as_ref()), "operation panicked");
            Err(ApiFailure::unclassified())
        }
    }
}

fn classify(err: &anyhow::Error) -> ApiFailure {
    let Some(handler_err) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<HandlerError>())
    else {
        let detail = format!("{err:#}");
        error!(error = %detail, "unclassified operation failure");
        return ApiFailure::unclassified();
    };

    let failure = ApiFailure::from(handler_err);
    match failure.kind {
        FailureKind::DependencyFailure => {
            let detail = format!("{err:#}");
            warn!(kind = %failure.kind, error = %detail, "operation failed");
        }
        FailureKind::NotImplemented | FailureKind::InvalidInput => {
            debug!(kind = %failure.kind, message = %failure.message, "operation rejected");
        }
    }
    failure
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
