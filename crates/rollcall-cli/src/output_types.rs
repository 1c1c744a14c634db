use chrono::{DateTime, Utc};
use rollcall_core::models::RosterStudent;
use rollcall_session::{AttemptOutcome, AttemptReport, RowActions};
use serde::Serialize;
use tabled::Tabled;

/// One schedule row with the actions it offers
#[derive(Debug, Serialize, Tabled)]
pub struct ScheduleRow {
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Period")]
    pub period: String,
    #[tabled(rename = "Course")]
    pub course: String,
    #[tabled(rename = "Room")]
    pub classroom: String,
    #[tabled(rename = "Present")]
    pub present: String,
    #[tabled(rename = "Manual GPS")]
    pub manual_gps: String,
}

impl From<&RowActions> for ScheduleRow {
    fn from(row: &RowActions) -> Self {
        Self {
            day: row.entry.day_of_week.clone(),
            period: format!("{}-{}", row.entry.time_start, row.entry.time_end),
            course: row.entry.course_name.clone(),
            classroom: row.entry.classroom.clone().unwrap_or_else(|| "-".to_string()),
            present: offered(row.present),
            manual_gps: offered(row.manual_gps),
        }
    }
}

fn offered(yes: bool) -> String {
    if yes { "offered" } else { "-" }.to_string()
}

/// Output for schedule command
#[derive(Debug, Serialize)]
pub struct ScheduleOutput {
    pub student_id: String,
    pub manual_gps_enabled: bool,
    pub rows: Vec<RowActions>,
}

/// Output for window toggle and set
#[derive(Debug, Serialize)]
pub struct WindowChangeOutput {
    pub window: String,
    pub snapshot_key: String,
    pub state: String,
    pub next_action: String,
}

/// Output for window status
#[derive(Debug, Serialize)]
pub struct WindowStatusOutput {
    pub student_id: String,
    pub fetched_at: DateTime<Utc>,
    pub windows: Vec<WindowStatusRow>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct WindowStatusRow {
    #[tabled(rename = "Window")]
    pub key: String,
    #[tabled(rename = "State")]
    pub state: String,
}

/// Output for flag reads and changes
#[derive(Debug, Serialize)]
pub struct FlagOutput {
    pub flag: String,
    pub enabled: bool,
}

/// Output for bulk manual-GPS changes
#[derive(Debug, Serialize)]
pub struct BulkFlagOutput {
    pub enabled: bool,
    pub students: Vec<String>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct RosterRow {
    #[tabled(rename = "Student ID")]
    pub student_id: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl From<&RosterStudent> for RosterRow {
    fn from(student: &RosterStudent) -> Self {
        Self {
            student_id: student.student_id.to_string(),
            name: student.name.clone(),
        }
    }
}

/// Output for attend command
#[derive(Debug, Serialize)]
pub struct AttendOutput {
    pub attempt_id: String,
    pub student_id: String,
    pub window: String,
    pub outcome: AttemptOutcome,
    pub states: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl From<&AttemptReport> for AttendOutput {
    fn from(report: &AttemptReport) -> Self {
        let attempt = &report.attempt;
        Self {
            attempt_id: attempt.id().to_string(),
            student_id: attempt.student_id().to_string(),
            window: attempt.window().to_string(),
            outcome: report.outcome.clone(),
            states: attempt.history().iter().map(|s| s.name().to_string()).collect(),
            started_at: attempt.started_at(),
        }
    }
}

/// Output for tune commands
#[derive(Debug, Serialize)]
pub struct TuneOutput {
    pub student_id: String,
    pub recognized: Option<bool>,
    pub message: String,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
