use rollcall_core::config::{LayeredConfig, DEFAULT_JPEG_QUALITY};
use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{CameraFacing, CaptureArtifact, Frame, StudentId};
use rollcall_core::ports::Camera;
use std::fmt;

use crate::normalize::normalize_frame;

/// Capture settings taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub jpeg_quality: u8,
    pub facing: CameraFacing,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            facing: CameraFacing::Back,
        }
    }
}

impl From<&LayeredConfig> for CaptureSettings {
    fn from(config: &LayeredConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality.value,
            facing: config.camera.value,
        }
    }
}

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Captured,
    Normalizing,
    Ready,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

enum Stage {
    Idle,
    Captured(Frame),
    Normalizing,
    Ready(CaptureArtifact),
    Failed(String),
}

/// Single-artifact capture pipeline: Idle → Captured → Normalizing → Ready | Failed
pub struct CapturePipeline<C>
where
    C: Camera,
{
    camera: C,
    settings: CaptureSettings,
    stage: Stage,
}

impl<C> CapturePipeline<C>
where
    C: Camera,
{
    pub fn new(camera: C, settings: CaptureSettings) -> Self {
        Self {
            camera,
            settings,
            stage: Stage::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        Self::state_of(&self.stage)
    }

    /// Reason for the last failure, if the pipeline is in `Failed`
    pub fn failure(&self) -> Option<&str> {
        match &self.stage {
            Stage::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn facing(&self) -> CameraFacing {
        self.settings.facing
    }

    /// Switch between front and back cameras
    pub fn flip_camera(&mut self) -> CameraFacing {
        self.settings.facing = self.settings.facing.flipped();
        self.settings.facing
    }

    /// Take one frame. Any unsubmitted artifact is discarded first.
    ///
    /// On failure the pipeline is left `Idle`.
    pub async fn capture(&mut self) -> Result<()> {
        if let Stage::Ready(_) = self.stage {
            tracing::debug!("Discarding unsubmitted capture artifact");
        }
        self.stage = Stage::Idle;

        let permission = self.camera.request_permission().await?;
        if !permission.is_granted() {
            tracing::info!("Camera permission denied");
            return Err(AttendanceError::PermissionDenied {
                capability: "camera".to_string(),
            });
        }

        let frame = self.camera.take_picture(self.settings.facing).await.map_err(|e| {
            tracing::warn!(error = %e, "Camera did not produce a frame");
            match e {
                AttendanceError::CaptureFailed { .. } => e,
                other => AttendanceError::CaptureFailed {
                    reason: other.to_string(),
                },
            }
        })?;

        tracing::debug!(bytes = frame.bytes.len(), facing = %frame.facing, "Frame captured");
        self.stage = Stage::Captured(frame);
        Ok(())
    }

    /// Orient and recompress the captured frame into an artifact for this student and course
    pub async fn normalize(&mut self, student_id: &StudentId, course_name: &str) -> Result<()> {
        let frame = match std::mem::replace(&mut self.stage, Stage::Normalizing) {
            Stage::Captured(frame) => frame,
            other => {
                let state = Self::state_of(&other);
                self.stage = other;
                return Err(AttendanceError::CaptureFailed {
                    reason: format!("Nothing to normalize in state {}", state),
                });
            }
        };

        let quality = self.settings.jpeg_quality;
        let outcome =
            tokio::task::spawn_blocking(move || normalize_frame(&frame.bytes, quality)).await;

        let normalized = match outcome {
            Ok(Ok(normalized)) => normalized,
            Ok(Err(e)) => return Err(self.fail(e)),
            Err(join_error) => {
                return Err(self.fail(AttendanceError::CaptureFailed {
                    reason: format!("Normalization task failed: {}", join_error),
                }))
            }
        };

        tracing::debug!(
            width = normalized.width,
            height = normalized.height,
            bytes = normalized.bytes.len(),
            "Frame normalized"
        );

        self.stage = Stage::Ready(CaptureArtifact::new(
            normalized.bytes,
            student_id.clone(),
            course_name,
            true,
        ));
        Ok(())
    }

    /// Hand out the ready artifact exactly once, returning the pipeline to `Idle`
    pub fn take_artifact(&mut self) -> Option<CaptureArtifact> {
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Ready(artifact) => Some(artifact),
            other => {
                self.stage = other;
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
    }

    fn fail(&mut self, error: AttendanceError) -> AttendanceError {
        tracing::warn!(error = %error, "Frame normalization failed");
        self.stage = Stage::Failed(error.to_string());
        error
    }

    fn state_of(stage: &Stage) -> PipelineState {
        match stage {
            Stage::Idle => PipelineState::Idle,
            Stage::Captured(_) => PipelineState::Captured,
            Stage::Normalizing => PipelineState::Normalizing,
            Stage::Ready(_) => PipelineState::Ready,
            Stage::Failed(_) => PipelineState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::StaticCamera;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use rollcall_core::ports::PermissionStatus;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(8, 6))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn student() -> StudentId {
        StudentId::new("S1")
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let mut pipeline =
            CapturePipeline::new(StaticCamera::new(png_bytes()), CaptureSettings::default());
        assert_eq!(pipeline.state(), PipelineState::Idle);

        pipeline.capture().await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Captured);

        pipeline.normalize(&student(), "CS101").await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Ready);

        let artifact = pipeline.take_artifact().unwrap();
        assert!(artifact.orientation_normalized());
        assert_eq!(artifact.course_name(), "CS101");
        assert_eq!(image::guess_format(artifact.image()).unwrap(), ImageFormat::Jpeg);

        // Consumed exactly once
        assert!(pipeline.take_artifact().is_none());
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_broken_camera_stays_idle() {
        let mut pipeline = CapturePipeline::new(StaticCamera::broken(), CaptureSettings::default());

        let err = pipeline.capture().await.unwrap_err();

        assert!(matches!(err, AttendanceError::CaptureFailed { .. }));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_camera_permission_denied() {
        let camera = StaticCamera::new(png_bytes()).with_permission(PermissionStatus::Denied);
        let mut pipeline = CapturePipeline::new(camera.clone(), CaptureSettings::default());

        let err = pipeline.capture().await.unwrap_err();

        assert!(matches!(err, AttendanceError::PermissionDenied { .. }));
        assert_eq!(camera.shot_count(), 0);
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_new_capture_discards_ready_artifact() {
        let mut pipeline =
            CapturePipeline::new(StaticCamera::new(png_bytes()), CaptureSettings::default());
        pipeline.capture().await.unwrap();
        pipeline.normalize(&student(), "CS101").await.unwrap();

        pipeline.capture().await.unwrap();

        assert_eq!(pipeline.state(), PipelineState::Captured);
        assert!(pipeline.take_artifact().is_none());
    }

    #[tokio::test]
    async fn test_normalize_without_frame_is_rejected() {
        let mut pipeline =
            CapturePipeline::new(StaticCamera::new(png_bytes()), CaptureSettings::default());

        assert!(pipeline.normalize(&student(), "CS101").await.is_err());
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_undecodable_frame_fails() {
        let mut pipeline =
            CapturePipeline::new(StaticCamera::new(b"garbage".to_vec()), CaptureSettings::default());
        pipeline.capture().await.unwrap();

        assert!(pipeline.normalize(&student(), "CS101").await.is_err());
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(pipeline.failure().is_some());
        assert!(pipeline.take_artifact().is_none());
    }

    #[test]
    fn test_flip_camera() {
        let mut pipeline =
            CapturePipeline::new(StaticCamera::new(Vec::new()), CaptureSettings::default());
        assert_eq!(pipeline.flip_camera(), CameraFacing::Front);
        assert_eq!(pipeline.flip_camera(), CameraFacing::Back);
    }
}
