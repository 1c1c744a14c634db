//! Recognition-model tuning: training uploads and test recognitions.
//!
//! Both flows re-read the tuning flag from the server before every call.

use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{FlagKey, RecognitionVerdict, SessionContext, StudentId, TrainingImage};
use rollcall_core::ports::{FlagService, TuningService};
use std::sync::Arc;
use std::time::Duration;

use crate::call::with_timeout;
use crate::flags::FeatureFlagBroadcast;

pub struct TuningFlows<F, T>
where
    F: FlagService,
    T: TuningService,
{
    flags: Arc<FeatureFlagBroadcast<F>>,
    service: T,
    timeout: Duration,
}

impl<F, T> TuningFlows<F, T>
where
    F: FlagService,
    T: TuningService,
{
    pub fn new(flags: Arc<FeatureFlagBroadcast<F>>, service: T, timeout: Duration) -> Self {
        Self {
            flags,
            service,
            timeout,
        }
    }

    /// Upload a batch of training images for one student
    pub async fn upload(
        &self,
        session: &SessionContext,
        student_id: &StudentId,
        images: Vec<TrainingImage>,
    ) -> Result<String> {
        session.require_staff("upload training images")?;
        if images.is_empty() {
            return Err(AttendanceError::validation(
                "images",
                "at least one image is required",
            ));
        }
        self.require_enabled().await?;

        let count = images.len();
        let message = with_timeout(
            "upload training images",
            self.timeout,
            self.service.upload_training_images(student_id, images),
        )
        .await?;

        tracing::info!(student_id = %student_id, images = count, "Training images uploaded");
        Ok(message)
    }

    /// Check whether the recognizer matches `image` to `student_id`
    pub async fn test(
        &self,
        session: &SessionContext,
        student_id: &StudentId,
        image: TrainingImage,
    ) -> Result<RecognitionVerdict> {
        session.require_staff("test recognition")?;
        self.require_enabled().await?;

        with_timeout(
            "test recognition",
            self.timeout,
            self.service.test_recognition(student_id, image),
        )
        .await
    }

    async fn require_enabled(&self) -> Result<()> {
        if self.flags.read(&FlagKey::TuningEnabled).await? {
            Ok(())
        } else {
            Err(AttendanceError::ActionNotOffered {
                reason: "Model tuning is disabled".to_string(),
            })
        }
    }
}
