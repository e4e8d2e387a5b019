use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Classified outcome of a failed cloud request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{resource} '{name}' not found")]
    NotFound { resource: &'static str, name: String },
    #[error("execution role has not propagated yet: {0}")]
    RoleNotPropagated(String),
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },
}

impl ServiceError {
    pub fn not_found(resource: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            name: name.into(),
        }
    }

    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("timed out after {waited:?} trying to {action}")]
    TimedOut { action: String, waited: Duration },
    #[error("scenario {entry_point} failed: {reason}")]
    Assertion { entry_point: String, reason: String },
    #[error("deployment artifact not found at {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("cleanup failed: {}", join_failures(.0))]
    Cleanup(Vec<ServiceError>),
}

impl HarnessError {
    pub fn assertion(entry_point: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Assertion {
            entry_point: entry_point.into(),
            reason: reason.into(),
        }
    }
}

fn join_failures(failures: &[ServiceError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
