use rollcall_core::error::Result;
use rollcall_core::models::{RosterStudent, ScheduleEntry, StudentId};
use rollcall_core::ports::RosterService;
use std::time::Duration;

use crate::call::with_timeout;

/// Read-only schedule and roster lookups
pub struct RosterDirectory<R>
where
    R: RosterService,
{
    service: R,
    timeout: Duration,
}

impl<R> RosterDirectory<R>
where
    R: RosterService,
{
    pub fn new(service: R, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub async fn schedule(&self, student_id: &StudentId) -> Result<Vec<ScheduleEntry>> {
        with_timeout(
            "read schedule",
            self.timeout,
            self.service.student_schedule(student_id),
        )
        .await
    }

    /// Students whose name or id contains `query`, ignoring case
    pub async fn search(&self, query: &str) -> Result<Vec<RosterStudent>> {
        let students = with_timeout("list students", self.timeout, self.service.list_students())
            .await?;
        Ok(students
            .into_iter()
            .filter(|student| student.matches(query))
            .collect())
    }
}
