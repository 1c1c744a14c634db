use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    CaptureArtifact, GeofenceVerdict, LocationSample, RecognitionVerdict, RosterStudent,
    ScheduleEntry, StudentId, TrainingImage, WindowKey, WindowSnapshot, WindowState,
};

/// Port for the remote authority over attendance windows
#[async_trait]
pub trait WindowService: Send + Sync {
    /// Ask the server to put a window into `desired` state
    ///
    /// # Returns
    /// The state the server reports after the change
    async fn set_window(&self, key: &WindowKey, desired: WindowState) -> Result<WindowState>;

    /// Read every window state visible to a student
    async fn window_snapshot(&self, student_id: &StudentId) -> Result<WindowSnapshot>;
}

/// Port for remotely controlled feature flags
#[async_trait]
pub trait FlagService: Send + Sync {
    /// Whether a student may enter coordinates by hand
    async fn manual_gps_enabled(&self, student_id: &StudentId) -> Result<bool>;

    /// Set the manual-GPS flag for a set of students in one call
    async fn set_manual_gps(&self, student_ids: &[StudentId], enabled: bool) -> Result<()>;

    /// Set the manual-GPS flag for every student
    async fn set_manual_gps_all(&self, enabled: bool) -> Result<()>;

    /// Whether model tuning is enabled
    async fn tuning_enabled(&self) -> Result<bool>;

    /// Invert the tuning flag, returning the new value
    async fn toggle_tuning(&self) -> Result<bool>;
}

/// Port for the presence checks: geofence and face recognition
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Check whether a student's sample lies inside an allowed campus area
    ///
    /// Manual samples are only accepted for students with manual GPS enabled.
    async fn verify_location(
        &self,
        student_id: &StudentId,
        sample: &LocationSample,
    ) -> Result<GeofenceVerdict>;

    /// Upload a capture for recognition; the artifact is consumed
    async fn submit_capture(&self, artifact: CaptureArtifact) -> Result<RecognitionVerdict>;
}

/// Port for read-only schedule and roster data
#[async_trait]
pub trait RosterService: Send + Sync {
    /// Timetable rows for a student
    async fn student_schedule(&self, student_id: &StudentId) -> Result<Vec<ScheduleEntry>>;

    /// Every registered student
    async fn list_students(&self) -> Result<Vec<RosterStudent>>;
}

/// Port for the recognition-model tuning flows
#[async_trait]
pub trait TuningService: Send + Sync {
    /// Upload training images for a student, returning the server message
    async fn upload_training_images(
        &self,
        student_id: &StudentId,
        images: Vec<TrainingImage>,
    ) -> Result<String>;

    /// Run recognition on one image without recording attendance
    async fn test_recognition(
        &self,
        student_id: &StudentId,
        image: TrainingImage,
    ) -> Result<RecognitionVerdict>;
}
