use rollcall_capture::CapturePipeline;
use rollcall_core::error::{AttendanceError, Result};
use rollcall_core::models::{
    CameraFacing, GeofenceVerdict, LocationSample, RecognitionVerdict, SessionContext, StudentId,
    WindowKey, WindowSnapshot,
};
use rollcall_core::ports::{Camera, LocationSensor, VerificationService};
use rollcall_geo::LocationProvider;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::attempt::{Attempt, AttemptState, FailureReason};
use crate::call::guarded;
use crate::guard::InFlightSet;

/// Where the attempt's location sample comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationPath {
    /// Ask the device for a fix
    Device,
    /// Coordinates as typed by the student; parsed before use
    Manual { latitude: String, longitude: String },
}

impl LocationPath {
    pub fn manual(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        LocationPath::Manual {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }
}

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttemptOutcome {
    Succeeded { student_name: String },
    Failed(FailureReason),
    /// Abandoned by the caller; no result was applied
    Cancelled,
}

/// Final outcome plus the attempt's full state history
#[derive(Debug, Clone)]
pub struct AttemptReport {
    pub attempt: Attempt,
    pub outcome: AttemptOutcome,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one attendance attempt: location, geofence check, capture, recognition.
///
/// One attempt per student at a time. The capture pipeline is shared, so
/// concurrent attempts for different students take turns at the camera.
pub struct AttendanceSubmissionCoordinator<L, C, V>
where
    L: LocationSensor,
    C: Camera,
    V: VerificationService,
{
    location: LocationProvider<L>,
    pipeline: tokio::sync::Mutex<CapturePipeline<C>>,
    verifier: V,
    timeout: Duration,
    in_flight: InFlightSet,
    states: Mutex<HashMap<StudentId, AttemptState>>,
}

impl<L, C, V> AttendanceSubmissionCoordinator<L, C, V>
where
    L: LocationSensor,
    C: Camera,
    V: VerificationService,
{
    pub fn new(
        location: LocationProvider<L>,
        pipeline: CapturePipeline<C>,
        verifier: V,
        timeout: Duration,
    ) -> Self {
        Self {
            location,
            pipeline: tokio::sync::Mutex::new(pipeline),
            verifier,
            timeout,
            in_flight: InFlightSet::new(),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Progress of the student's attempt.
    ///
    /// Live state while an attempt is in flight, `Succeeded` once recorded.
    /// A failed or cancelled attempt leaves the student at `NotStarted`; its
    /// reason travels in the returned report.
    pub fn state_of(&self, student_id: &StudentId) -> AttemptState {
        let recorded = lock(&self.states).get(student_id).cloned();
        match recorded {
            Some(state)
                if self.in_flight.is_active(student_id)
                    || matches!(state, AttemptState::Succeeded { .. }) =>
            {
                state
            }
            _ => AttemptState::NotStarted,
        }
    }

    pub async fn flip_camera(&self) -> CameraFacing {
        self.pipeline.lock().await.flip_camera()
    }

    /// Run one attempt for the session's student.
    ///
    /// The device path is entered only when `snapshot` shows the window open.
    /// The manual path is entered whenever chosen; the server decides whether
    /// the student may use it. Returns `Err` only when no attempt was started
    /// (wrong role, action not offered, or an attempt already in flight).
    pub async fn submit(
        &self,
        session: &SessionContext,
        key: &WindowKey,
        snapshot: &WindowSnapshot,
        path: LocationPath,
        cancel: &CancellationToken,
    ) -> Result<AttemptReport> {
        let student_id = session.require_student("submit attendance")?.clone();

        if path == LocationPath::Device && !snapshot.is_open(key) {
            return Err(AttendanceError::ActionNotOffered {
                reason: format!("Attendance is not open for {}", key),
            });
        }

        let _guard = self.in_flight.try_acquire(&student_id)?;
        let mut attempt = Attempt::new(student_id.clone(), key.clone());
        self.record(&attempt);

        tracing::info!(
            attempt = %attempt.id(),
            student_id = %student_id,
            window = %key,
            manual = matches!(path, LocationPath::Manual { .. }),
            "Attendance attempt started"
        );

        let outcome = match self.drive(&mut attempt, &path, cancel).await {
            Ok(student_name) => {
                attempt.advance(AttemptState::Succeeded {
                    student_name: student_name.clone(),
                })?;
                tracing::info!(attempt = %attempt.id(), student_name = %student_name, "Attendance recorded");
                AttemptOutcome::Succeeded { student_name }
            }
            Err(AttendanceError::Cancelled) => {
                tracing::info!(attempt = %attempt.id(), state = %attempt.state(), "Attendance attempt cancelled");
                lock(&self.states).remove(&student_id);
                return Ok(AttemptReport {
                    attempt,
                    outcome: AttemptOutcome::Cancelled,
                });
            }
            Err(e) => {
                let reason = FailureReason::from(&e);
                tracing::warn!(attempt = %attempt.id(), kind = %reason.kind, error = %e, "Attendance attempt failed");
                attempt.fail(reason.clone())?;
                lock(&self.states).remove(&student_id);
                return Ok(AttemptReport {
                    attempt,
                    outcome: AttemptOutcome::Failed(reason),
                });
            }
        };

        self.record(&attempt);
        Ok(AttemptReport { attempt, outcome })
    }

    /// Walk the attempt up to `Uploading` and return the recognized name
    async fn drive(
        &self,
        attempt: &mut Attempt,
        path: &LocationPath,
        cancel: &CancellationToken,
    ) -> Result<String> {
        self.advance(attempt, AttemptState::LocationPending)?;
        let sample = self.acquire_location(path, cancel).await?;

        let verdict = guarded(
            cancel,
            "verify location",
            self.timeout,
            self.verifier.verify_location(attempt.student_id(), &sample),
        )
        .await?;
        if let GeofenceVerdict::Rejected { reason } = verdict {
            return Err(AttendanceError::GeofenceRejected { reason });
        }

        self.advance(attempt, AttemptState::LocationVerified)?;
        self.advance(attempt, AttemptState::Capturing)?;

        let student_id = attempt.student_id().clone();
        let course = attempt.window().course.clone();
        let artifact = {
            let mut pipeline =
                guarded(cancel, "wait for camera", self.timeout, async {
                    Ok(self.pipeline.lock().await)
                })
                .await?;

            let captured = async {
                guarded(cancel, "capture frame", self.timeout, pipeline.capture()).await?;
                guarded(
                    cancel,
                    "normalize frame",
                    self.timeout,
                    pipeline.normalize(&student_id, &course),
                )
                .await?;
                pipeline.take_artifact().ok_or_else(|| AttendanceError::CaptureFailed {
                    reason: "Pipeline produced no artifact".to_string(),
                })
            }
            .await;

            if captured.is_err() {
                pipeline.reset();
            }
            captured?
        };

        self.advance(attempt, AttemptState::Uploading)?;
        let verdict = guarded(
            cancel,
            "submit attendance",
            self.timeout,
            self.verifier.submit_capture(artifact),
        )
        .await?;

        match verdict {
            RecognitionVerdict::Recognized { student_name } => Ok(student_name),
            RecognitionVerdict::Rejected { reason } => {
                Err(AttendanceError::RecognitionRejected { reason })
            }
        }
    }

    async fn acquire_location(
        &self,
        path: &LocationPath,
        cancel: &CancellationToken,
    ) -> Result<LocationSample> {
        match path {
            LocationPath::Device => {
                guarded(cancel, "acquire location", self.timeout, self.location.acquire_device())
                    .await
            }
            LocationPath::Manual {
                latitude,
                longitude,
            } => self.location.acquire_manual(latitude, longitude),
        }
    }

    fn advance(&self, attempt: &mut Attempt, next: AttemptState) -> Result<()> {
        attempt.advance(next)?;
        self.record(attempt);
        Ok(())
    }

    fn record(&self, attempt: &Attempt) {
        lock(&self.states).insert(attempt.student_id().clone(), attempt.state().clone());
    }
}
