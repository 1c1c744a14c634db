//! State machine for one attendance attempt.
//!
//! `NotStarted → LocationPending → LocationVerified → Capturing → Uploading`,
//! ending in `Succeeded` or `Failed`. Any stage before `Succeeded` may fail.
//! Terminal attempts are never resumed; `reset` starts a new one.

use chrono::{DateTime, Utc};
use rollcall_core::error::{AttendanceError, FailureKind, Result};
use rollcall_core::models::{StudentId, WindowKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why an attempt failed, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&AttendanceError> for FailureReason {
    fn from(error: &AttendanceError) -> Self {
        Self::new(error.failure_kind(), error.user_message())
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptState {
    NotStarted,
    LocationPending,
    LocationVerified,
    Capturing,
    Uploading,
    Succeeded { student_name: String },
    Failed(FailureReason),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Succeeded { .. } | AttemptState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttemptState::NotStarted => "NotStarted",
            AttemptState::LocationPending => "LocationPending",
            AttemptState::LocationVerified => "LocationVerified",
            AttemptState::Capturing => "Capturing",
            AttemptState::Uploading => "Uploading",
            AttemptState::Succeeded { .. } => "Succeeded",
            AttemptState::Failed(_) => "Failed",
        }
    }

    fn can_advance_to(&self, next: &AttemptState) -> bool {
        use AttemptState::*;
        match (self, next) {
            (NotStarted, LocationPending) => true,
            (LocationPending, LocationVerified) => true,
            (LocationVerified, Capturing) => true,
            (Capturing, Uploading) => true,
            (Uploading, Succeeded { .. }) => true,
            (LocationPending | LocationVerified | Capturing | Uploading, Failed(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One run of the attendance flow for a student and window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    id: Uuid,
    student_id: StudentId,
    window: WindowKey,
    state: AttemptState,
    history: Vec<AttemptState>,
    started_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(student_id: StudentId, window: WindowKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id,
            window,
            state: AttemptState::NotStarted,
            history: vec![AttemptState::NotStarted],
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> &StudentId {
        &self.student_id
    }

    pub fn window(&self) -> &WindowKey {
        &self.window
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Every state this attempt has been in, oldest first
    pub fn history(&self) -> &[AttemptState] {
        &self.history
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether the attempt ever reached `state`
    pub fn visited(&self, name: &str) -> bool {
        self.history.iter().any(|s| s.name() == name)
    }

    pub fn advance(&mut self, next: AttemptState) -> Result<()> {
        if !self.state.can_advance_to(&next) {
            return Err(AttendanceError::InvalidTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }

        tracing::debug!(
            attempt = %self.id,
            student_id = %self.student_id,
            from = %self.state,
            to = %next,
            "Attempt transition"
        );
        self.history.push(next.clone());
        self.state = next;
        Ok(())
    }

    pub fn fail(&mut self, reason: FailureReason) -> Result<()> {
        self.advance(AttemptState::Failed(reason))
    }
}
