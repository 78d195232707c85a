use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a failed operation as seen by callers of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The operation is intentionally unsupported by this build.
    NotImplemented,
    /// The request failed validation.
    InvalidInput,
    /// A collaborator (storage, downstream service) could not complete the
    /// operation. Also used for every failure that could not be classified.
    DependencyFailure,
}

impl FailureKind {
    /// Returns the wire name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotImplemented => "not_implemented",
            Self::InvalidInput => "invalid_input",
            Self::DependencyFailure => "dependency_failure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures a handler may signal. Anything else a handler returns is
/// unclassified and reported as [`FailureKind::DependencyFailure`].
///
/// Only the message of a `DependencyFailure` reaches callers; its `source`
/// is kept for the error chain the execution wrapper logs.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("operation not implemented: {operation}")]
    NotImplemented { operation: &'static str },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{message}")]
    DependencyFailure {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HandlerError {
    #[must_use]
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented { operation }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn dependency_failure(message: impl Into<String>) -> Self {
        Self::DependencyFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Dependency failure caused by `source`, e.g. a storage error.
    pub fn dependency_failure_caused_by(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::DependencyFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotImplemented { .. } => FailureKind::NotImplemented,
            Self::InvalidInput(_) => FailureKind::InvalidInput,
            Self::DependencyFailure { .. } => FailureKind::DependencyFailure,
        }
    }
}

/// Diagnostic reported for failures that carry no classification.
pub const UNCLASSIFIED_MESSAGE: &str = "internal error while executing operation";

/// Classified failure produced by the execution wrapper.
///
/// This is the only error type that leaves the core: handler errors are
/// converted into it and unclassified errors are replaced by a generic one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_implemented(operation: &str) -> Self {
        Self::new(
            FailureKind::NotImplemented,
            format!("operation not implemented: {operation}"),
        )
    }

    pub fn dependency_failure(message: impl Into<String>) -> Self {
        Self::new(FailureKind::DependencyFailure, message)
    }

    /// Failure used in place of an error that could not be classified.
    #[must_use]
    pub fn unclassified() -> Self {
        Self::dependency_failure(UNCLASSIFIED_MESSAGE)
    }
}

impl From<&HandlerError> for ApiFailure {
    fn from(err: &HandlerError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl From<HandlerError> for ApiFailure {
    fn from(err: HandlerError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            HandlerError::not_implemented("x").kind(),
            FailureKind::NotImplemented
        );
        assert_eq!(
            HandlerError::invalid_input("bad id").kind(),
            FailureKind::InvalidInput
        );
        assert_eq!(
            HandlerError::dependency_failure("db down").kind(),
            FailureKind::DependencyFailure
        );
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_value(FailureKind::NotImplemented).unwrap();
        assert_eq!(json, "not_implemented");
        assert_eq!(FailureKind::DependencyFailure.to_string(), "dependency_failure");
    }

    #[test]
    fn api_failure_keeps_handler_message() {
        let failure = ApiFailure::from(HandlerError::invalid_input("bad id"));
        assert_eq!(failure.kind, FailureKind::InvalidInput);
        assert_eq!(failure.message, "bad id");
        assert_eq!(failure.to_string(), "invalid_input: bad id");
    }

    #[test]
    fn not_implemented_messages_agree() {
        let from_handler = ApiFailure::from(HandlerError::not_implemented("attempt.save_stats"));
        assert_eq!(from_handler, ApiFailure::not_implemented("attempt.save_stats"));
    }

    #[test]
    fn dependency_failure_keeps_cause_out_of_message() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "pool exhausted");
        let err = HandlerError::dependency_failure_caused_by("job store unavailable", cause);

        let source = std::error::Error::source(&err).expect("cause attached");
        assert_eq!(source.to_string(), "pool exhausted");
        assert_eq!(
            ApiFailure::from(&err),
            ApiFailure::dependency_failure("job store unavailable")
        );
    }

    #[test]
    fn unclassified_is_dependency_failure() {
        let failure = ApiFailure::unclassified();
        assert_eq!(failure.kind, FailureKind::DependencyFailure);
        assert_eq!(failure.message, UNCLASSIFIED_MESSAGE);
    }
}
