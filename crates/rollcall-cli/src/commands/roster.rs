//! Roster command implementation

use crate::backend::AttendanceBackend;
use crate::cli::RosterArgs;
use crate::output::OutputWriter;
use crate::output_types::RosterRow;
use anyhow::Result;
use rollcall_core::config::LayeredConfig;
use rollcall_session::RosterDirectory;

pub async fn execute<B: AttendanceBackend>(
    args: RosterArgs,
    service: B,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let directory = RosterDirectory::new(service, config.request_timeout());
    let students = directory.search(args.query.as_deref().unwrap_or("")).await?;
    let rows: Vec<RosterRow> = students.iter().map(RosterRow::from).collect();

    if output.is_json() {
        output.result(rows)?;
    } else {
        output.section(format!("Students ({})", rows.len()));
        output.table(rows);
    }

    Ok(())
}
