use attempt_api_core::{
    operation_ids, InternalOperationResult, SaveStatsRequest, SetWorkflowInAttemptRequest,
};

use crate::network::InFlightGuard;

/// Context carried with every operation through the pipeline.
#[derive(Debug)]
pub struct OperationContext {
    /// Process-unique id assigned when the operation is built.
    pub call_id: u64,
    /// Value of the inbound `x-request-id` header, if any.
    pub request_id: Option<String>,
    /// Keeps the operation counted as in flight. The router holds it until
    /// the route returns, even if the caller stops waiting.
    pub in_flight: Option<InFlightGuard>,
}

impl OperationContext {
    #[must_use]
    pub fn new(call_id: u64) -> Self {
        Self {
            call_id,
            request_id: None,
            in_flight: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn with_in_flight(mut self, guard: InFlightGuard) -> Self {
        self.in_flight = Some(guard);
        self
    }
}

/// Typed operation variants dispatched through the pipeline.
#[derive(Debug)]
pub enum Operation {
    SaveStats {
        ctx: OperationContext,
        payload: SaveStatsRequest,
    },
    SetWorkflowInAttempt {
        ctx: OperationContext,
        payload: SetWorkflowInAttemptRequest,
    },
}

impl Operation {
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        match self {
            Self::SaveStats { ctx, .. } | Self::SetWorkflowInAttempt { ctx, .. } => ctx,
        }
    }

    pub fn ctx_mut(&mut self) -> &mut OperationContext {
        match self {
            Self::SaveStats { ctx, .. } | Self::SetWorkflowInAttempt { ctx, .. } => ctx,
        }
    }

    /// Route-table key for this operation.
    #[must_use]
    pub fn operation_id(&self) -> &'static str {
        match self {
            Self::SaveStats { .. } => operation_ids::SAVE_STATS,
            Self::SetWorkflowInAttempt { .. } => operation_ids::SET_WORKFLOW_IN_ATTEMPT,
        }
    }
}

/// Successful response from an operation route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResponse {
    Internal(InternalOperationResult),
}
