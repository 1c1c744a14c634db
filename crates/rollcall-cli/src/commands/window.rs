//! Window command implementation

use crate::backend::AttendanceBackend;
use crate::cli::{WindowArgs, WindowCommand, WindowSetArgs, WindowStatusArgs, WindowToggleArgs};
use crate::errors;
use crate::output::OutputWriter;
use crate::output_types::{WindowChangeOutput, WindowStatusOutput, WindowStatusRow};
use crate::progress::{finish_error, finish_success, spinner_for};
use anyhow::Result;
use rollcall_core::config::LayeredConfig;
use rollcall_core::models::{SessionContext, StudentId, WindowKey, WindowState};
use rollcall_session::SessionWindowRegistry;

pub async fn execute<B: AttendanceBackend>(
    args: WindowArgs,
    service: B,
    session: &SessionContext,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let registry = SessionWindowRegistry::new(service, config.request_timeout());

    match args.command {
        WindowCommand::Toggle(args) => toggle(args, &registry, session, output).await,
        WindowCommand::Set(args) => set(args, &registry, session, output).await,
        WindowCommand::Status(args) => status(args, &registry, session, output).await,
    }
}

async fn toggle<B: AttendanceBackend>(
    args: WindowToggleArgs,
    registry: &SessionWindowRegistry<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    let key = args.window.key();

    match args.via_student {
        Some(student) => {
            let snapshot = registry.snapshot(&StudentId::new(student)).await?;
            registry.track(&key, &snapshot);
        }
        None => output.warning(
            "Current state not read; treating the window as closed (use --via-student to read it)",
        ),
    }

    let spinner = spinner_for(output.is_json(), &format!("{}...", registry.label(&key)));
    let result = registry.toggle(session, &key).await;
    report_change(&key, result, registry, &spinner, output)
}

async fn set<B: AttendanceBackend>(
    args: WindowSetArgs,
    registry: &SessionWindowRegistry<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    let key = args.window.key();
    let desired = WindowState::from_open(args.open && !args.close);

    let spinner = spinner_for(output.is_json(), &format!("Setting {} to {:?}...", key, desired));
    let result = registry.set(session, &key, desired).await;
    report_change(&key, result, registry, &spinner, output)
}

fn report_change<B: AttendanceBackend>(
    key: &WindowKey,
    result: rollcall_core::Result<WindowState>,
    registry: &SessionWindowRegistry<B>,
    spinner: &indicatif::ProgressBar,
    output: &OutputWriter,
) -> Result<()> {
    let state = match result {
        Ok(state) => state,
        Err(e) => {
            finish_error(spinner, &e.to_string());
            return Err(e.into());
        }
    };

    let word = if state.is_open() { "open" } else { "closed" };
    finish_success(spinner, &format!("{} is now {}", key, word));

    if output.is_json() {
        output.result(WindowChangeOutput {
            window: key.to_string(),
            snapshot_key: key.snapshot_key(),
            state: word.to_string(),
            next_action: registry.label(key).to_string(),
        })?;
    } else {
        output.kv("Next action", registry.label(key));
    }
    Ok(())
}

async fn status<B: AttendanceBackend>(
    args: WindowStatusArgs,
    registry: &SessionWindowRegistry<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    let student_id = match args.student {
        Some(student) => StudentId::new(student),
        None => session
            .require_student("read window status")
            .map_err(|_| errors::student_required("window status"))?
            .clone(),
    };

    let snapshot = registry.snapshot(&student_id).await?;
    let mut windows: Vec<WindowStatusRow> = snapshot
        .windows
        .iter()
        .map(|(key, open)| WindowStatusRow {
            key: key.clone(),
            state: if *open { "open" } else { "closed" }.to_string(),
        })
        .collect();
    windows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        output.result(WindowStatusOutput {
            student_id: student_id.to_string(),
            fetched_at: snapshot.fetched_at,
            windows,
        })?;
    } else {
        output.section(format!("Windows visible to {}", student_id));
        output.table(windows);
    }
    Ok(())
}
