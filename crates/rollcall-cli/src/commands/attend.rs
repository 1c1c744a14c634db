//! Attend command implementation

use crate::backend::AttendanceBackend;
use crate::cli::AttendArgs;
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use crate::output_types::AttendOutput;
use crate::progress::{attempt_step_message, finish_error, finish_success, spinner_for};
use anyhow::Result;
use rollcall_capture::{CapturePipeline, CaptureSettings, FileCamera};
use rollcall_core::config::{CliConfigOverrides, LayeredConfig};
use rollcall_core::models::{FlagKey, SessionContext};
use rollcall_core::ports::PermissionStatus;
use rollcall_geo::{FixedLocationSensor, LocationProvider};
use rollcall_session::{
    row_actions, AttemptOutcome, AttendancePath, AttendanceSubmissionCoordinator,
    FeatureFlagBroadcast, LocationPath, RosterDirectory, SessionWindowRegistry,
};
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn execute<B: AttendanceBackend>(
    args: AttendArgs,
    service: B,
    session: &SessionContext,
    mut config: LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let student_id = session
        .require_student("submit attendance")
        .map_err(|_| errors::student_required("attend"))?
        .clone();
    config.update_from_cli(CliConfigOverrides {
        jpeg_quality: args.quality,
        camera: args.camera,
        ..Default::default()
    });
    let timeout = config.request_timeout();
    let key = args.window.key();

    ensure_readable(&args.image)?;
    if let Some(front) = &args.front_image {
        ensure_readable(front)?;
    }

    let (path, gate) = match (&args.manual_lat, &args.manual_lon) {
        (Some(lat), Some(lon)) => (
            LocationPath::manual(lat.as_str(), lon.as_str()),
            AttendancePath::ManualOverride,
        ),
        _ => (LocationPath::Device, AttendancePath::Window),
    };

    // Offered actions come from the same reads the schedule view uses
    let roster = RosterDirectory::new(service.clone(), timeout);
    let registry = SessionWindowRegistry::new(service.clone(), timeout);
    let flags = FeatureFlagBroadcast::new(service.clone(), timeout);
    let manual_gps_key = FlagKey::ManualGps(student_id.clone());
    let (entries, snapshot, manual_enabled) = tokio::try_join!(
        roster.schedule(&student_id),
        registry.snapshot(&student_id),
        flags.read(&manual_gps_key),
    )?;

    let rows = row_actions(&entries, Some(&snapshot), manual_enabled);
    let row = rows
        .iter()
        .find(|row| row.key.as_ref() == Some(&key))
        .ok_or_else(|| errors::class_not_scheduled(&key.to_string()))?;
    row.require(gate)?;

    let sensor = match (args.device_lat, args.device_lon) {
        (Some(lat), Some(lon)) => FixedLocationSensor::new(lat, lon),
        _ if gate == AttendancePath::Window => return Err(errors::no_location_fix().into()),
        // Manual attempts never ask the device
        _ => FixedLocationSensor::new(0.0, 0.0).with_permission(PermissionStatus::Denied),
    };

    let mut camera = FileCamera::new(&args.image);
    if let Some(front) = &args.front_image {
        camera = camera.with_front(front);
    }

    let coordinator = AttendanceSubmissionCoordinator::new(
        LocationProvider::new(sensor),
        CapturePipeline::new(camera, CaptureSettings::from(&config)),
        service,
        timeout,
    );
    if args.flip {
        let facing = coordinator.flip_camera().await;
        tracing::debug!(camera = %facing, "Camera flipped");
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let spinner = spinner_for(output.is_json(), &format!("Marking attendance for {}...", key));
    let submitted = coordinator
        .submit(session, &key, &snapshot, path, &cancel)
        .await;
    interrupt.abort();
    let report = submitted?;

    match &report.outcome {
        AttemptOutcome::Succeeded { student_name } => {
            finish_success(&spinner, &format!("Attendance recorded for {}", student_name))
        }
        AttemptOutcome::Failed(reason) => finish_error(&spinner, &reason.to_string()),
        AttemptOutcome::Cancelled => finish_error(&spinner, "Cancelled"),
    }

    if output.is_json() {
        output.result(AttendOutput::from(&report))?;
    } else {
        output.section("Attempt");
        output.kv("Id", report.attempt.id());
        for state in report.attempt.history() {
            output.kv(state.name(), attempt_step_message(state));
        }
    }

    match report.outcome {
        AttemptOutcome::Failed(reason) => Err(CliError::new("Attendance not recorded")
            .with_context(format!("{}: {}", reason.kind, reason.message))
            .with_suggestion("Fix the problem above and run the command again; each run is a fresh attempt")
            .into()),
        AttemptOutcome::Cancelled => {
            output.info("Attempt cancelled; nothing was recorded");
            Ok(())
        }
        AttemptOutcome::Succeeded { .. } => Ok(()),
    }
}

fn ensure_readable(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(errors::image_unreadable(&path.display().to_string(), "not a file").into()),
        Err(e) => Err(errors::image_unreadable(&path.display().to_string(), &e.to_string()).into()),
    }
}
