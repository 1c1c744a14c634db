//! Who is using the client, built once at startup and passed to each component.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AttendanceError, Result};

/// Institution-issued student identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(String);

impl TeacherId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of the signed-in user; each variant carries only its own identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    Student { student_id: StudentId },
    Teacher { teacher_id: TeacherId },
    Admin,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Student { .. } => "student",
            Role::Teacher { .. } => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Explicit session handed to every component that needs role data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub email: Option<String>,
    pub role: Role,
}

impl SessionContext {
    pub fn new(role: Role) -> Self {
        Self { email: None, role }
    }

    pub fn student(student_id: impl Into<String>) -> Self {
        Self::new(Role::Student {
            student_id: StudentId::new(student_id),
        })
    }

    pub fn teacher(teacher_id: impl Into<String>) -> Self {
        Self::new(Role::Teacher {
            teacher_id: TeacherId::new(teacher_id),
        })
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// The acting student, or `Unauthorized` for other roles
    pub fn require_student(&self, action: &str) -> Result<&StudentId> {
        match &self.role {
            Role::Student { student_id } => Ok(student_id),
            other => Err(unauthorized(other, action)),
        }
    }

    /// Teachers open and close windows
    pub fn require_teacher(&self, action: &str) -> Result<&TeacherId> {
        match &self.role {
            Role::Teacher { teacher_id } => Ok(teacher_id),
            other => Err(unauthorized(other, action)),
        }
    }

    pub fn require_admin(&self, action: &str) -> Result<()> {
        match &self.role {
            Role::Admin => Ok(()),
            other => Err(unauthorized(other, action)),
        }
    }

    /// Teachers and admins both manage the manual-GPS roster
    pub fn require_staff(&self, action: &str) -> Result<()> {
        match &self.role {
            Role::Teacher { .. } | Role::Admin => Ok(()),
            other => Err(unauthorized(other, action)),
        }
    }
}

fn unauthorized(role: &Role, action: &str) -> AttendanceError {
    AttendanceError::Unauthorized {
        role: role.name().to_string(),
        action: action.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_requirements() {
        let student = SessionContext::student("S1");
        assert_eq!(student.require_student("attend").unwrap().as_str(), "S1");
        assert!(student.require_teacher("toggle window").is_err());
        assert!(student.require_staff("set manual gps").is_err());

        let teacher = SessionContext::teacher("T1");
        assert!(teacher.require_staff("set manual gps").is_ok());
        assert!(teacher.require_admin("toggle tuning").is_err());

        let admin = SessionContext::admin();
        assert!(admin.require_admin("toggle tuning").is_ok());
        assert!(admin.require_staff("set manual gps").is_ok());
    }

    #[test]
    fn test_unauthorized_message() {
        let err = SessionContext::student("S1").require_admin("toggle tuning").unwrap_err();
        assert_eq!(err.to_string(), "student is not allowed to toggle tuning");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Student {
            student_id: StudentId::new("S1"),
        })
        .unwrap();
        assert_eq!(json, r#"{"role":"student","student_id":"S1"}"#);
    }
}
