//! Schedule command implementation

use crate::backend::AttendanceBackend;
use crate::cli::ScheduleArgs;
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{ScheduleOutput, ScheduleRow};
use anyhow::Result;
use rollcall_core::config::LayeredConfig;
use rollcall_core::models::{FlagKey, SessionContext};
use rollcall_session::gate::for_day;
use rollcall_session::{row_actions, FeatureFlagBroadcast, RosterDirectory, SessionWindowRegistry};

pub async fn execute<B: AttendanceBackend>(
    args: ScheduleArgs,
    service: B,
    session: &SessionContext,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let student_id = session
        .require_student("view a schedule")
        .map_err(|_| errors::student_required("schedule"))?
        .clone();
    let timeout = config.request_timeout();

    let roster = RosterDirectory::new(service.clone(), timeout);
    let registry = SessionWindowRegistry::new(service.clone(), timeout);
    let flags = FeatureFlagBroadcast::new(service, timeout);

    let manual_gps_key = FlagKey::ManualGps(student_id.clone());

    let (entries, snapshot, manual_enabled) = tokio::try_join!(
        roster.schedule(&student_id),
        registry.snapshot(&student_id),
        flags.read(&manual_gps_key),
    )?;

    let mut rows = row_actions(&entries, Some(&snapshot), manual_enabled);
    if let Some(day) = args.day {
        rows = for_day(&rows, day).into_iter().cloned().collect();
    }

    if output.is_json() {
        output.result(ScheduleOutput {
            student_id: student_id.to_string(),
            manual_gps_enabled: manual_enabled,
            rows,
        })?;
    } else {
        output.section(format!("Schedule for {}", student_id));
        let table: Vec<ScheduleRow> = rows.iter().map(ScheduleRow::from).collect();
        output.table(table);
        if manual_enabled {
            output.info("Manual GPS is enabled for you");
        }
    }

    Ok(())
}
