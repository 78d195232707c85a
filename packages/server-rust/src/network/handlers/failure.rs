//! Translation of classified operation failures into HTTP responses.

use attempt_api_core::{ApiFailure, FailureKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info};

use crate::service::Availability;

/// JSON body of every failed attempt operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: FailureKind,
    pub message: String,
    pub operation: &'static str,
    /// Only present for `not_implemented`: whether the operation was retired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,
}

/// Error half of every attempt endpoint.
#[derive(Debug)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ErrorResponse {
    /// Builds the response for `failure` of `operation`.
    ///
    /// `availability` only matters for `not_implemented`: it sets the
    /// `permanent` flag and the log level of the call.
    #[must_use]
    pub fn new(
        operation: &'static str,
        failure: ApiFailure,
        availability: Option<Availability>,
    ) -> Self {
        let permanent = match failure.kind {
            FailureKind::NotImplemented => {
                let permanent = availability.is_some_and(Availability::is_permanent);
                if permanent {
                    debug!(operation, "call to removed operation");
                } else {
                    info!(operation, "call to operation not implemented yet");
                }
                Some(permanent)
            }
            FailureKind::InvalidInput | FailureKind::DependencyFailure => None,
        };

        Self {
            status: status_for(failure.kind),
            body: ErrorBody {
                kind: failure.kind,
                message: failure.message,
                operation,
                permanent,
            },
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status reported for each failure kind.
#[must_use]
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
        FailureKind::DependencyFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
