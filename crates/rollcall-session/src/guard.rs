//! Single-in-flight attempt tracking per student.

use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::StudentId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Students with an attempt currently running
#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    active: Arc<Mutex<HashSet<StudentId>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `student_id`; released when the guard drops
    pub fn try_acquire(&self, student_id: &StudentId) -> Result<InFlightGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(student_id.clone()) {
            return Err(AttendanceError::AttemptInProgress {
                student_id: student_id.to_string(),
            });
        }
        Ok(InFlightGuard {
            active: Arc::clone(&self.active),
            student_id: student_id.clone(),
        })
    }

    pub fn is_active(&self, student_id: &StudentId) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.contains(student_id)
    }
}

/// Held for the lifetime of one attempt
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<StudentId>>>,
    student_id: StudentId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.remove(&self.student_id);
    }
}
