//! In-memory attendance service for development and testing.
//!
//! Holds the same state the server does (windows, flags, roster, enrolled
//! faces) and answers every service port from it. Tests can take the service
//! offline, slow it down, or force recognition rejections.
//!
//! This implementation uses `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. Use `HttpAttendanceClient` against a real server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{
    CaptureArtifact, GeofenceVerdict, LocationSample, LocationSource, RecognitionVerdict,
    RosterStudent, ScheduleEntry, StudentId, TrainingImage, WindowKey, WindowSnapshot,
    WindowState,
};
use rollcall_core::ports::{
    FlagService, RosterService, TuningService, VerificationService, WindowService,
};
use rollcall_geo::Geofence;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One attendance mark recorded by a successful recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub student_id: StudentId,
    pub student_name: String,
    pub course_name: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ServerState {
    windows: HashMap<String, bool>,
    manual_gps: HashMap<StudentId, bool>,
    students: Vec<RosterStudent>,
    schedules: HashMap<StudentId, Vec<ScheduleEntry>>,
    tuning_enabled: bool,
    /// Student id to display name for students the recognizer knows
    enrolled: HashMap<StudentId, String>,
    training_images: HashMap<StudentId, usize>,
    records: Vec<AttendanceRecord>,
}

#[derive(Debug, Default)]
struct Controls {
    offline: bool,
    latency: Option<Duration>,
    forced_rejection: Option<String>,
    calls: HashMap<&'static str, usize>,
}

/// In-memory implementation of every attendance service port
#[derive(Debug, Clone)]
pub struct MemoryAttendanceService {
    geofence: Arc<Geofence>,
    state: Arc<RwLock<ServerState>>,
    controls: Arc<RwLock<Controls>>,
}

impl Default for MemoryAttendanceService {
    /// A service whose campus is a single site in Bengaluru
    fn default() -> Self {
        Self::new(Geofence::around(12.97, 77.59))
    }
}

impl MemoryAttendanceService {
    pub fn new(geofence: Geofence) -> Self {
        Self {
            geofence: Arc::new(geofence),
            state: Arc::new(RwLock::new(ServerState::default())),
            controls: Arc::new(RwLock::new(Controls::default())),
        }
    }

    /// Register a student on the roster
    pub fn add_student(&self, id: i64, student_id: &str, name: &str) {
        let mut state = self.state.write().unwrap();
        state.students.push(RosterStudent {
            id,
            name: name.to_string(),
            student_id: StudentId::new(student_id),
        });
    }

    /// Teach the recognizer a student's face
    pub fn enroll(&self, student_id: &StudentId, student_name: &str) {
        let mut state = self.state.write().unwrap();
        state.enrolled.insert(student_id.clone(), student_name.to_string());
    }

    pub fn add_schedule(&self, student_id: &StudentId, entry: ScheduleEntry) {
        let mut state = self.state.write().unwrap();
        state.schedules.entry(student_id.clone()).or_default().push(entry);
    }

    /// Set a window directly, bypassing any client
    pub fn open_window(&self, key: &WindowKey, open: bool) {
        let mut state = self.state.write().unwrap();
        state.windows.insert(key.snapshot_key(), open);
    }

    pub fn set_tuning(&self, enabled: bool) {
        self.state.write().unwrap().tuning_enabled = enabled;
    }

    pub fn set_manual_flag(&self, student_id: &StudentId, enabled: bool) {
        let mut state = self.state.write().unwrap();
        state.manual_gps.insert(student_id.clone(), enabled);
    }

    pub fn manual_flag(&self, student_id: &StudentId) -> bool {
        let state = self.state.read().unwrap();
        state.manual_gps.get(student_id).copied().unwrap_or(false)
    }

    pub fn window_open(&self, key: &WindowKey) -> bool {
        let state = self.state.read().unwrap();
        state.windows.get(&key.snapshot_key()).copied().unwrap_or(false)
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.state.read().unwrap().records.clone()
    }

    pub fn training_image_count(&self, student_id: &StudentId) -> usize {
        let state = self.state.read().unwrap();
        state.training_images.get(student_id).copied().unwrap_or(0)
    }

    /// Make every call fail as if the network were down
    pub fn set_offline(&self, offline: bool) {
        self.controls.write().unwrap().offline = offline;
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.controls.write().unwrap().latency = latency;
    }

    /// Reject every recognition upload with `reason`, or stop doing so with `None`
    pub fn force_recognition_rejection(&self, reason: Option<&str>) {
        self.controls.write().unwrap().forced_rejection = reason.map(str::to_string);
    }

    /// Number of calls made to one endpoint, named by its route
    pub fn call_count(&self, endpoint: &str) -> usize {
        let controls = self.controls.read().unwrap();
        controls.calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Total calls across every endpoint
    pub fn total_calls(&self) -> usize {
        self.controls.read().unwrap().calls.values().sum()
    }

    /// Count the call, apply latency, and fail when offline
    async fn enter(&self, endpoint: &'static str) -> Result<()> {
        let (latency, offline) = {
            let mut controls = self.controls.write().unwrap();
            *controls.calls.entry(endpoint).or_default() += 1;
            (controls.latency, controls.offline)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if offline {
            tracing::debug!(endpoint, "Memory service is offline");
            return Err(AttendanceError::network(endpoint, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl WindowService for MemoryAttendanceService {
    async fn set_window(&self, key: &WindowKey, desired: WindowState) -> Result<WindowState> {
        self.enter("toggle_attendance").await?;
        let mut state = self.state.write().unwrap();
        state.windows.insert(key.snapshot_key(), desired.is_open());
        Ok(desired)
    }

    async fn window_snapshot(&self, _student_id: &StudentId) -> Result<WindowSnapshot> {
        self.enter("get_attendance_status").await?;
        let state = self.state.read().unwrap();
        Ok(WindowSnapshot::new(state.windows.clone()))
    }
}

#[async_trait]
impl FlagService for MemoryAttendanceService {
    async fn manual_gps_enabled(&self, student_id: &StudentId) -> Result<bool> {
        self.enter("get_student_manual_attendance_status").await?;
        let state = self.state.read().unwrap();
        if !state.students.iter().any(|s| &s.student_id == student_id) {
            return Err(AttendanceError::Server {
                operation: "read manual GPS flag".to_string(),
                status: 404,
                message: "Student not found".to_string(),
            });
        }
        Ok(state.manual_gps.get(student_id).copied().unwrap_or(false))
    }

    async fn set_manual_gps(&self, student_ids: &[StudentId], enabled: bool) -> Result<()> {
        self.enter("toggle_manual_attendance_selected").await?;
        let mut state = self.state.write().unwrap();
        for student_id in student_ids {
            state.manual_gps.insert(student_id.clone(), enabled);
        }
        Ok(())
    }

    async fn set_manual_gps_all(&self, enabled: bool) -> Result<()> {
        self.enter("toggle_manual_attendance_all").await?;
        let mut state = self.state.write().unwrap();
        let ids: Vec<StudentId> = state.students.iter().map(|s| s.student_id.clone()).collect();
        for student_id in ids {
            state.manual_gps.insert(student_id, enabled);
        }
        Ok(())
    }

    async fn tuning_enabled(&self) -> Result<bool> {
        self.enter("get_train_model_status").await?;
        Ok(self.state.read().unwrap().tuning_enabled)
    }

    async fn toggle_tuning(&self) -> Result<bool> {
        self.enter("toggle_train_model").await?;
        let mut state = self.state.write().unwrap();
        state.tuning_enabled = !state.tuning_enabled;
        Ok(state.tuning_enabled)
    }
}

#[async_trait]
impl VerificationService for MemoryAttendanceService {
    async fn verify_location(
        &self,
        student_id: &StudentId,
        sample: &LocationSample,
    ) -> Result<GeofenceVerdict> {
        self.enter("check_student_location").await?;

        if sample.source == LocationSource::Manual && !self.manual_flag(student_id) {
            return Ok(GeofenceVerdict::Rejected {
                reason: "Manual location entry is not enabled for this student.".to_string(),
            });
        }

        if self.geofence.contains(&sample.coordinates) {
            Ok(GeofenceVerdict::Accepted)
        } else {
            Ok(GeofenceVerdict::Rejected {
                reason: "You are not within the allowed area to take attendance.".to_string(),
            })
        }
    }

    async fn submit_capture(&self, artifact: CaptureArtifact) -> Result<RecognitionVerdict> {
        self.enter("process_attendance").await?;
        artifact.ensure_normalized()?;

        let forced = self.controls.read().unwrap().forced_rejection.clone();
        if let Some(reason) = forced {
            return Ok(RecognitionVerdict::Rejected { reason });
        }

        let mut state = self.state.write().unwrap();
        let Some(student_name) = state.enrolled.get(artifact.student_id()).cloned() else {
            return Ok(RecognitionVerdict::Rejected {
                reason: "Face not recognized.".to_string(),
            });
        };

        state.records.push(AttendanceRecord {
            student_id: artifact.student_id().clone(),
            student_name: student_name.clone(),
            course_name: artifact.course_name().to_string(),
            recorded_at: Utc::now(),
        });
        Ok(RecognitionVerdict::Recognized { student_name })
    }
}

#[async_trait]
impl RosterService for MemoryAttendanceService {
    async fn student_schedule(&self, student_id: &StudentId) -> Result<Vec<ScheduleEntry>> {
        self.enter("get_student_schedule").await?;
        let state = self.state.read().unwrap();
        Ok(state.schedules.get(student_id).cloned().unwrap_or_default())
    }

    async fn list_students(&self) -> Result<Vec<RosterStudent>> {
        self.enter("get_students").await?;
        Ok(self.state.read().unwrap().students.clone())
    }
}

#[async_trait]
impl TuningService for MemoryAttendanceService {
    async fn upload_training_images(
        &self,
        student_id: &StudentId,
        images: Vec<TrainingImage>,
    ) -> Result<String> {
        self.enter("facial-recognition/upload").await?;
        if images.is_empty() {
            return Err(AttendanceError::validation("images", "at least one image is required"));
        }

        let mut state = self.state.write().unwrap();
        *state.training_images.entry(student_id.clone()).or_default() += images.len();
        Ok(format!("Uploaded {} images for {}", images.len(), student_id))
    }

    async fn test_recognition(
        &self,
        student_id: &StudentId,
        _image: TrainingImage,
    ) -> Result<RecognitionVerdict> {
        self.enter("facial-recognition/test").await?;
        let state = self.state.read().unwrap();
        if state.enrolled.contains_key(student_id) {
            Ok(RecognitionVerdict::Recognized {
                student_name: student_id.to_string(),
            })
        } else {
            Ok(RecognitionVerdict::Rejected {
                reason: "Face not recognized".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::models::{Coordinates, Day, TimeSlot};

    fn key() -> WindowKey {
        WindowKey::new(Day::Mon, TimeSlot::new("10:30", "11:30").unwrap(), "CS101")
    }

    fn sample(lat: f64, lon: f64, source: LocationSource) -> LocationSample {
        LocationSample::new(Coordinates::new(lat, lon).unwrap(), source)
    }

    #[tokio::test]
    async fn test_set_window_and_snapshot() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");

        assert!(!service.window_snapshot(&student).await.unwrap().is_open(&key()));
        service.set_window(&key(), WindowState::Open).await.unwrap();
        assert!(service.window_snapshot(&student).await.unwrap().is_open(&key()));
        assert_eq!(service.call_count("toggle_attendance"), 1);
    }

    #[tokio::test]
    async fn test_geofence_verdicts() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");

        let inside = service
            .verify_location(&student, &sample(12.97, 77.59, LocationSource::Device))
            .await
            .unwrap();
        assert_eq!(inside, GeofenceVerdict::Accepted);

        let outside = service
            .verify_location(&student, &sample(0.0, 0.0, LocationSource::Device))
            .await
            .unwrap();
        assert!(matches!(outside, GeofenceVerdict::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_manual_sample_needs_flag() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");
        let manual = sample(12.97, 77.59, LocationSource::Manual);

        let refused = service.verify_location(&student, &manual).await.unwrap();
        assert!(matches!(refused, GeofenceVerdict::Rejected { .. }));

        service.set_manual_flag(&student, true);
        let accepted = service.verify_location(&student, &manual).await.unwrap();
        assert_eq!(accepted, GeofenceVerdict::Accepted);
    }

    #[tokio::test]
    async fn test_recognition_records_attendance() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");
        service.enroll(&student, "Asha");

        let artifact = CaptureArtifact::new(vec![1], student.clone(), "CS101", true);
        let verdict = service.submit_capture(artifact).await.unwrap();

        assert_eq!(
            verdict,
            RecognitionVerdict::Recognized {
                student_name: "Asha".to_string()
            }
        );
        assert_eq!(service.records().len(), 1);
        assert_eq!(service.records()[0].course_name, "CS101");
    }

    #[tokio::test]
    async fn test_forced_rejection() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");
        service.enroll(&student, "Asha");
        service.force_recognition_rejection(Some("no match"));

        let artifact = CaptureArtifact::new(vec![1], student, "CS101", true);
        let verdict = service.submit_capture(artifact).await.unwrap();

        assert_eq!(
            verdict,
            RecognitionVerdict::Rejected {
                reason: "no match".to_string()
            }
        );
        assert!(service.records().is_empty());
    }

    #[tokio::test]
    async fn test_offline_fails_with_network_error() {
        let service = MemoryAttendanceService::default();
        service.set_offline(true);

        let err = service.tuning_enabled().await.unwrap_err();
        assert!(matches!(err, AttendanceError::Network { .. }));
        assert_eq!(service.call_count("get_train_model_status"), 1);
    }

    #[tokio::test]
    async fn test_set_all_covers_roster() {
        let service = MemoryAttendanceService::default();
        service.add_student(1, "S1", "Asha");
        service.add_student(2, "S2", "Ravi");

        service.set_manual_gps_all(true).await.unwrap();

        assert!(service.manual_gps_enabled(&StudentId::new("S1")).await.unwrap());
        assert!(service.manual_gps_enabled(&StudentId::new("S2")).await.unwrap());
        assert!(service.manual_gps_enabled(&StudentId::new("S9")).await.is_err());
    }

    #[tokio::test]
    async fn test_bulk_set_only_touches_selection() {
        let service = MemoryAttendanceService::default();
        let s1 = StudentId::new("S1");
        let s2 = StudentId::new("S2");
        service.set_manual_flag(&s2, true);

        service.set_manual_gps(&[s1.clone()], true).await.unwrap();

        assert!(service.manual_flag(&s1));
        assert!(service.manual_flag(&s2));
    }

    #[tokio::test]
    async fn test_tuning_upload_counts_images() {
        let service = MemoryAttendanceService::default();
        let student = StudentId::new("S1");
        let images = vec![
            TrainingImage::new("a.jpg", vec![1]),
            TrainingImage::new("b.jpg", vec![2]),
        ];

        service.upload_training_images(&student, images).await.unwrap();

        assert_eq!(service.training_image_count(&student), 2);
        assert!(service.upload_training_images(&student, Vec::new()).await.is_err());
    }
}
