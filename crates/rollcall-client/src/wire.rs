//! JSON bodies exchanged with the attendance server.
//!
//! Field names follow the server's existing routes, so several structs mix
//! snake_case and camelCase on purpose.

use rollcall_core::models::{
    LocationSample, LocationSource, RosterStudent, StudentId, WindowKey, WindowState,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body of `POST /toggle_attendance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleAttendanceRequest {
    pub day: String,
    pub period: String,
    pub status: bool,
    pub course: String,
}

impl ToggleAttendanceRequest {
    pub fn new(key: &WindowKey, desired: WindowState) -> Self {
        Self {
            day: key.day.code().to_string(),
            period: key.slot.period(),
            status: desired.is_open(),
            course: key.course.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleAttendanceResponse {
    pub status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceStatusResponse {
    #[serde(rename = "isAttendanceOpen", default)]
    pub is_attendance_open: HashMap<String, Option<bool>>,
}

impl AttendanceStatusResponse {
    /// Null entries are treated as closed
    pub fn into_windows(self) -> HashMap<String, bool> {
        self.is_attendance_open
            .into_iter()
            .map(|(key, open)| (key, open.unwrap_or(false)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualStatusResponse {
    pub manual_attendance_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSelectedRequest {
    pub student_ids: Vec<StudentId>,
    pub enable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualAllRequest {
    pub is_enabled: bool,
}

/// Body of `POST /check_student_location`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCheckRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub source: LocationSource,
    pub student_id: StudentId,
}

impl LocationCheckRequest {
    pub fn new(student_id: &StudentId, sample: &LocationSample) -> Self {
        Self {
            latitude: sample.latitude(),
            longitude: sample.longitude(),
            source: sample.source,
            student_id: student_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationCheckResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl LocationCheckResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Response of `POST /process_attendance`, for both success and rejection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAttendanceResponse {
    pub success: bool,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainModelStatusResponse {
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainModelToggleResponse {
    #[serde(default)]
    pub success: bool,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentsResponse {
    pub students: Vec<RosterStudent>,
}

/// `{message, student_id?}` from the facial-recognition routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionMessage {
    pub message: String,
    #[serde(default)]
    pub student_id: Option<String>,
}

/// Generic `{error}` / `{message}` body used by failing routes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    pub fn reason(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}
