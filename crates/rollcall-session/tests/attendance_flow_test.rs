//! End-to-end attendance flows against the in-memory service
//!
//! Teacher, student, and admin views share one service, the way three phones
//! share one server.

use image::{DynamicImage, ImageFormat, RgbImage};
use rollcall_capture::{CapturePipeline, CaptureSettings, StaticCamera};
use rollcall_client::MemoryAttendanceService;
use rollcall_core::error::{AttendanceError, FailureKind};
use rollcall_core::models::{
    Day, FlagKey, ScheduleEntry, SessionContext, StudentId, TimeSlot, WindowKey, WindowState,
};
use rollcall_geo::{FixedLocationSensor, LocationProvider};
use rollcall_session::{
    row_actions, AttemptOutcome, AttemptState, AttendancePath, AttendanceSubmissionCoordinator,
    FeatureFlagBroadcast, LocationPath, SessionWindowRegistry,
};
use std::io::Cursor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(15);

type Coordinator =
    AttendanceSubmissionCoordinator<FixedLocationSensor, StaticCamera, MemoryAttendanceService>;

fn frame() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(16, 12))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn cs101_monday() -> WindowKey {
    WindowKey::new(Day::Mon, TimeSlot::new("10:30", "11:30").unwrap(), "CS101")
}

fn schedule_row() -> ScheduleEntry {
    ScheduleEntry {
        id: 7,
        course_name: "CS101".to_string(),
        day_of_week: "mon".to_string(),
        time_start: "10:30".to_string(),
        time_end: "11:30".to_string(),
        classroom: Some("B-204".to_string()),
    }
}

fn asha() -> StudentId {
    StudentId::new("S1")
}

/// A campus server with Asha enrolled and on the roster
fn campus() -> MemoryAttendanceService {
    let service = MemoryAttendanceService::default();
    service.add_student(1, "S1", "Asha");
    service.enroll(&asha(), "Asha");
    service.add_schedule(&asha(), schedule_row());
    service
}

fn coordinator_at(service: &MemoryAttendanceService, lat: f64, lon: f64) -> Coordinator {
    coordinator_with_timeout(service, lat, lon, TIMEOUT)
}

fn coordinator_with_timeout(
    service: &MemoryAttendanceService,
    lat: f64,
    lon: f64,
    timeout: Duration,
) -> Coordinator {
    AttendanceSubmissionCoordinator::new(
        LocationProvider::new(FixedLocationSensor::new(lat, lon)),
        CapturePipeline::new(StaticCamera::new(frame()), CaptureSettings::default()),
        service.clone(),
        timeout,
    )
}

fn state_names(states: &[AttemptState]) -> Vec<&'static str> {
    states.iter().map(|s| s.name()).collect()
}

#[tokio::test]
async fn test_closed_window_does_not_offer_present() {
    let service = campus();
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);

    let snapshot = registry.snapshot(&asha()).await.unwrap();
    let rows = row_actions(&[schedule_row()], Some(&snapshot), false);

    assert!(!snapshot.is_open(&cs101_monday()));
    assert!(!rows[0].present);
    assert!(rows[0].require(AttendancePath::Window).is_err());
}

#[tokio::test]
async fn test_teacher_opens_window_and_student_is_recognized() {
    let service = campus();
    let teacher_view = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let student_view = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let student = SessionContext::student("S1");

    let state = teacher_view
        .toggle(&SessionContext::teacher("T1"), &cs101_monday())
        .await
        .unwrap();
    assert_eq!(state, WindowState::Open);

    let snapshot = student_view.snapshot(&asha()).await.unwrap();
    let rows = row_actions(&[schedule_row()], Some(&snapshot), false);
    let key = rows[0].require(AttendancePath::Window).unwrap().clone();

    let coordinator = coordinator_at(&service, 12.97, 77.59);
    let report = coordinator
        .submit(
            &student,
            &key,
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        report.outcome,
        AttemptOutcome::Succeeded {
            student_name: "Asha".to_string()
        }
    );
    assert_eq!(
        state_names(report.attempt.history()),
        vec![
            "NotStarted",
            "LocationPending",
            "LocationVerified",
            "Capturing",
            "Uploading",
            "Succeeded"
        ]
    );
    assert_eq!(service.records().len(), 1);
    assert_eq!(service.records()[0].course_name, "CS101");
    assert_eq!(coordinator.state_of(&asha()).name(), "Succeeded");
}

#[tokio::test]
async fn test_manual_path_hidden_and_rejected_without_flag() {
    let service = campus();
    let flags = FeatureFlagBroadcast::new(service.clone(), TIMEOUT);

    let manual_enabled = flags.read(&FlagKey::ManualGps(asha())).await.unwrap();
    let rows = row_actions(&[schedule_row()], None, manual_enabled);
    assert!(!rows[0].manual_gps);

    // Forced past the gate, the server still refuses
    let coordinator = coordinator_at(&service, 0.0, 0.0);
    let report = coordinator
        .submit(
            &SessionContext::student("S1"),
            &cs101_monday(),
            &rollcall_core::models::WindowSnapshot::new(Default::default()),
            LocationPath::manual("12.97", "77.59"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match report.outcome {
        AttemptOutcome::Failed(reason) => assert_eq!(reason.kind, FailureKind::GeofenceRejected),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(service.records().is_empty());
}

#[tokio::test]
async fn test_manual_path_with_flag_enabled() {
    let service = campus();
    let flags = FeatureFlagBroadcast::new(service.clone(), TIMEOUT);
    flags
        .toggle(&SessionContext::teacher("T1"), &FlagKey::ManualGps(asha()))
        .await
        .unwrap();

    let manual_enabled = flags.read(&FlagKey::ManualGps(asha())).await.unwrap();
    let rows = row_actions(&[schedule_row()], None, manual_enabled);
    let key = rows[0].require(AttendancePath::ManualOverride).unwrap().clone();

    // Device sensor is far away; the typed coordinates are what count
    let coordinator = coordinator_at(&service, 0.0, 0.0);
    let report = coordinator
        .submit(
            &SessionContext::student("S1"),
            &key,
            &rollcall_core::models::WindowSnapshot::new(Default::default()),
            LocationPath::manual(" 12.97 ", "77.59"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(matches!(report.outcome, AttemptOutcome::Succeeded { .. }));
}

#[tokio::test]
async fn test_recognition_rejection_then_retry_starts_fresh() {
    let service = campus();
    service.open_window(&cs101_monday(), true);
    service.force_recognition_rejection(Some("no match"));
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let snapshot = registry.snapshot(&asha()).await.unwrap();
    let coordinator = coordinator_at(&service, 12.97, 77.59);
    let student = SessionContext::student("S1");

    let first = coordinator
        .submit(
            &student,
            &cs101_monday(),
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match &first.outcome {
        AttemptOutcome::Failed(reason) => {
            assert_eq!(reason.kind, FailureKind::RecognitionRejected);
            assert_eq!(reason.message, "no match");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    service.force_recognition_rejection(None);
    let second = coordinator
        .submit(
            &student,
            &cs101_monday(),
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_ne!(first.attempt.id(), second.attempt.id());
    assert_eq!(second.attempt.history()[0], AttemptState::NotStarted);
    assert!(matches!(second.outcome, AttemptOutcome::Succeeded { .. }));
    // Location re-verified on the retry
    assert_eq!(service.call_count("check_student_location"), 2);
}

#[tokio::test]
async fn test_toggle_twice_restores_original_state() {
    let service = campus();
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let teacher = SessionContext::teacher("T1");

    let before = registry.snapshot(&asha()).await.unwrap().state(&cs101_monday());
    registry.toggle(&teacher, &cs101_monday()).await.unwrap();
    registry.toggle(&teacher, &cs101_monday()).await.unwrap();
    let after = registry.snapshot(&asha()).await.unwrap().state(&cs101_monday());

    assert_eq!(before, after);
}

#[tokio::test]
async fn test_out_of_range_manual_pair_never_reaches_network() {
    let service = campus();
    service.set_manual_flag(&asha(), true);
    let coordinator = coordinator_at(&service, 12.97, 77.59);
    let calls_before = service.total_calls();

    let report = coordinator
        .submit(
            &SessionContext::student("S1"),
            &cs101_monday(),
            &rollcall_core::models::WindowSnapshot::new(Default::default()),
            LocationPath::manual("91.0", "77.59"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match report.outcome {
        AttemptOutcome::Failed(reason) => assert_eq!(reason.kind, FailureKind::Validation),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(service.total_calls(), calls_before);
}

#[tokio::test]
async fn test_geofence_failure_never_uploads() {
    let service = campus();
    service.open_window(&cs101_monday(), true);
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let snapshot = registry.snapshot(&asha()).await.unwrap();
    let coordinator = coordinator_at(&service, 40.0, -74.0);

    let report = coordinator
        .submit(
            &SessionContext::student("S1"),
            &cs101_monday(),
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!report.attempt.visited("LocationVerified"));
    assert!(!report.attempt.visited("Uploading"));
    assert_eq!(service.call_count("process_attendance"), 0);
}

#[tokio::test]
async fn test_slow_server_fails_with_timeout() {
    let service = campus();
    service.open_window(&cs101_monday(), true);
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let snapshot = registry.snapshot(&asha()).await.unwrap();
    service.set_latency(Some(Duration::from_millis(500)));
    let coordinator = coordinator_with_timeout(&service, 12.97, 77.59, Duration::from_millis(50));

    let report = coordinator
        .submit(
            &SessionContext::student("S1"),
            &cs101_monday(),
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    match report.outcome {
        AttemptOutcome::Failed(reason) => {
            assert_eq!(reason.kind, FailureKind::Timeout);
            assert!(reason.message.contains("timed out"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_attempt_applies_nothing() {
    let service = campus();
    service.open_window(&cs101_monday(), true);
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let snapshot = registry.snapshot(&asha()).await.unwrap();
    service.set_latency(Some(Duration::from_millis(300)));
    let coordinator = coordinator_at(&service, 12.97, 77.59);
    let cancel = CancellationToken::new();

    let student = SessionContext::student("S1");
    let session = cs101_monday();
    let (report, _) = tokio::join!(
        coordinator.submit(
            &student,
            &session,
            &snapshot,
            LocationPath::Device,
            &cancel,
        ),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    );

    let report = report.unwrap();
    assert_eq!(report.outcome, AttemptOutcome::Cancelled);
    assert_eq!(coordinator.state_of(&asha()), AttemptState::NotStarted);
    assert!(service.records().is_empty());

    // The in-flight slot was released
    service.set_latency(None);
    let retry = coordinator
        .submit(
            &SessionContext::student("S1"),
            &cs101_monday(),
            &snapshot,
            LocationPath::Device,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(matches!(retry.outcome, AttemptOutcome::Succeeded { .. }));
}

#[tokio::test]
async fn test_duplicate_attempt_for_same_student_rejected() {
    let service = campus();
    service.open_window(&cs101_monday(), true);
    let registry = SessionWindowRegistry::new(service.clone(), TIMEOUT);
    let snapshot = registry.snapshot(&asha()).await.unwrap();
    service.set_latency(Some(Duration::from_millis(100)));
    let coordinator = coordinator_at(&service, 12.97, 77.59);
    let student = SessionContext::student("S1");
    let cancel = CancellationToken::new();

    let session = cs101_monday();
    let (first, second) = tokio::join!(
        coordinator.submit(&student, &session, &snapshot, LocationPath::Device, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            coordinator
                .submit(&student, &cs101_monday(), &snapshot, LocationPath::Device, &cancel)
                .await
        }
    );

    assert!(matches!(first.unwrap().outcome, AttemptOutcome::Succeeded { .. }));
    assert!(matches!(second, Err(AttendanceError::AttemptInProgress { .. })));
    assert_eq!(service.records().len(), 1);
}
