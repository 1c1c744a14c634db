//! Which actions a student's schedule row offers.
//!
//! "Present" needs the row's window open in the latest snapshot. "Manual GPS"
//! needs the student's manual-GPS flag. Missing data never offers an action.

use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{Day, ScheduleEntry, WindowKey, WindowSnapshot};
use serde::Serialize;

/// How a student proves presence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendancePath {
    /// Device location, offered while the window is open
    Window,
    /// Hand-entered coordinates, offered while the manual-GPS flag is on
    ManualOverride,
}

/// Actions offered for one schedule row
#[derive(Debug, Clone, Serialize)]
pub struct RowActions {
    pub entry: ScheduleEntry,
    #[serde(skip)]
    pub key: Option<WindowKey>,
    pub present: bool,
    pub manual_gps: bool,
}

impl RowActions {
    pub fn offers(&self, path: AttendancePath) -> bool {
        match path {
            AttendancePath::Window => self.present,
            AttendancePath::ManualOverride => self.manual_gps,
        }
    }

    /// Fail with `ActionNotOffered` unless `path` is available on this row
    pub fn require(&self, path: AttendancePath) -> Result<&WindowKey> {
        let key = self.key.as_ref().ok_or_else(|| AttendanceError::ActionNotOffered {
            reason: format!(
                "Schedule row {} has no valid day or period",
                self.entry.id
            ),
        })?;

        if !self.offers(path) {
            let reason = match path {
                AttendancePath::Window => format!("Attendance is not open for {}", key),
                AttendancePath::ManualOverride => {
                    "Manual GPS is not enabled for this student".to_string()
                }
            };
            return Err(AttendanceError::ActionNotOffered { reason });
        }
        Ok(key)
    }
}

/// Compute offered actions for each row.
///
/// Without a snapshot no window counts as open.
pub fn row_actions(
    entries: &[ScheduleEntry],
    snapshot: Option<&WindowSnapshot>,
    manual_gps_enabled: bool,
) -> Vec<RowActions> {
    entries
        .iter()
        .map(|entry| {
            let key = match entry.window_key() {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!(entry = entry.id, error = %e, "Schedule row has no window key");
                    None
                }
            };
            let present = match (&key, snapshot) {
                (Some(key), Some(snapshot)) => snapshot.is_open(key),
                _ => false,
            };
            RowActions {
                entry: entry.clone(),
                present,
                manual_gps: key.is_some() && manual_gps_enabled,
                key,
            }
        })
        .collect()
}

/// Rows that fall on `day`
pub fn for_day(rows: &[RowActions], day: Day) -> Vec<&RowActions> {
    rows.iter().filter(|row| row.entry.falls_on(day)).collect()
}
