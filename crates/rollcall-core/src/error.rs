//! Error types for Rollcall

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    // Device errors
    #[error("{capability} permission denied")]
    PermissionDenied { capability: String },

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("Capture artifact has not been normalized")]
    ArtifactNotNormalized,

    // Remote errors
    #[error("Network failure during {operation}: {reason}")]
    Network { operation: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Server returned {status} during {operation}: {message}")]
    Server {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("Location rejected: {reason}")]
    GeofenceRejected { reason: String },

    #[error("Recognition rejected: {reason}")]
    RecognitionRejected { reason: String },

    // Session errors
    #[error("An attendance attempt is already in flight for student {student_id}")]
    AttemptInProgress { student_id: String },

    #[error("A toggle for window {window} is already pending")]
    ToggleInFlight { window: String },

    #[error("State of window {window} is unknown after a failed toggle. Refresh before toggling")]
    WindowStateIndeterminate { window: String },

    #[error("Action not offered: {reason}")]
    ActionNotOffered { reason: String },

    #[error("{role} is not allowed to {action}")]
    Unauthorized { role: String, action: String },

    #[error("Invalid attempt transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

/// User-facing classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    PermissionDenied,
    Validation,
    Network,
    Timeout,
    GeofenceRejected,
    RecognitionRejected,
    Capture,
    NotOffered,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::Validation => "invalid input",
            FailureKind::Network => "network failure",
            FailureKind::Timeout => "timeout",
            FailureKind::GeofenceRejected => "location rejected",
            FailureKind::RecognitionRejected => "recognition rejected",
            FailureKind::Capture => "capture failed",
            FailureKind::NotOffered => "not offered",
            FailureKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}

impl AttendanceError {
    /// Classify this error for display to the user
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AttendanceError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            AttendanceError::Validation { .. } => FailureKind::Validation,
            AttendanceError::CaptureFailed { .. } | AttendanceError::ArtifactNotNormalized => {
                FailureKind::Capture
            }
            AttendanceError::Network { .. } | AttendanceError::Server { .. } => {
                FailureKind::Network
            }
            AttendanceError::Timeout { .. } => FailureKind::Timeout,
            AttendanceError::GeofenceRejected { .. } => FailureKind::GeofenceRejected,
            AttendanceError::RecognitionRejected { .. } => FailureKind::RecognitionRejected,
            AttendanceError::AttemptInProgress { .. }
            | AttendanceError::ToggleInFlight { .. }
            | AttendanceError::WindowStateIndeterminate { .. }
            | AttendanceError::ActionNotOffered { .. }
            | AttendanceError::Unauthorized { .. } => FailureKind::NotOffered,
            AttendanceError::InvalidTransition { .. }
            | AttendanceError::Cancelled
            | AttendanceError::ConfigMissing { .. }
            | AttendanceError::ConfigInvalid { .. }
            | AttendanceError::Io(_)
            | AttendanceError::Serialization(_) => FailureKind::Internal,
        }
    }

    /// The reason to show the user, without the variant prefix
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::GeofenceRejected { reason }
            | AttendanceError::RecognitionRejected { reason } => reason.clone(),
            other => other.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AttendanceError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn network(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        AttendanceError::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for AttendanceError {
    fn from(err: serde_json::Error) -> Self {
        AttendanceError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_distinguishable_from_network() {
        let network = AttendanceError::network("submit capture", "connection refused");
        let rejected = AttendanceError::RecognitionRejected {
            reason: "no match".to_string(),
        };

        assert_eq!(network.failure_kind(), FailureKind::Network);
        assert_eq!(rejected.failure_kind(), FailureKind::RecognitionRejected);
        assert_eq!(rejected.user_message(), "no match");
    }

    #[test]
    fn test_server_error_counts_as_network() {
        let err = AttendanceError::Server {
            operation: "verify location".to_string(),
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.failure_kind(), FailureKind::Network);
    }

    #[test]
    fn test_timeout_kind() {
        let err = AttendanceError::Timeout {
            operation: "submit capture".to_string(),
            seconds: 15,
        };
        assert_eq!(err.failure_kind(), FailureKind::Timeout);
        assert_eq!(err.to_string(), "submit capture timed out after 15s");
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
    }
}
