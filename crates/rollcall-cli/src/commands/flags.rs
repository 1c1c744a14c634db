//! Flags command implementation

use crate::backend::AttendanceBackend;
use crate::cli::{AllArgs, BulkArgs, FlagsArgs, FlagsCommand, ManualGpsArgs, TuningFlagArgs};
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use crate::output_types::{BulkFlagOutput, FlagOutput};
use anyhow::Result;
use dialoguer::{Confirm, MultiSelect};
use rollcall_core::config::LayeredConfig;
use rollcall_core::models::{FlagKey, SessionContext, StudentId};
use rollcall_session::{FeatureFlagBroadcast, RosterDirectory};
use std::collections::BTreeSet;

pub async fn execute<B: AttendanceBackend>(
    args: FlagsArgs,
    service: B,
    session: &SessionContext,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let timeout = config.request_timeout();
    let flags = FeatureFlagBroadcast::new(service.clone(), timeout);

    match args.command {
        FlagsCommand::Tuning(args) => tuning(args, &flags, session, output).await,
        FlagsCommand::ManualGps(args) => manual_gps(args, &flags, session, output).await,
        FlagsCommand::Bulk(args) => {
            let roster = RosterDirectory::new(service, timeout);
            bulk(args, &flags, &roster, session, output).await
        }
        FlagsCommand::All(args) => all(args, &flags, session, output).await,
    }
}

async fn tuning<B: AttendanceBackend>(
    args: TuningFlagArgs,
    flags: &FeatureFlagBroadcast<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    let key = FlagKey::TuningEnabled;
    let enabled = if args.toggle {
        flags.toggle(session, &key).await?
    } else {
        flags.read(&key).await?
    };
    show_flag(&key, enabled, args.toggle, output)
}

async fn manual_gps<B: AttendanceBackend>(
    args: ManualGpsArgs,
    flags: &FeatureFlagBroadcast<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    let student_id = match args.student {
        Some(student) => StudentId::new(student),
        None => session
            .require_student("read the manual GPS flag")
            .map_err(|_| errors::student_required("flags manual-gps"))?
            .clone(),
    };

    let key = FlagKey::ManualGps(student_id);
    let enabled = if args.toggle {
        flags.toggle(session, &key).await?
    } else {
        flags.read(&key).await?
    };
    show_flag(&key, enabled, args.toggle, output)
}

fn show_flag(key: &FlagKey, enabled: bool, changed: bool, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        output.result(FlagOutput {
            flag: key.to_string(),
            enabled,
        })?;
    } else {
        let word = if enabled { "enabled" } else { "disabled" };
        if changed {
            output.success(format!("{} is now {}", key, word));
        } else {
            output.kv(key, word);
        }
    }
    Ok(())
}

async fn bulk<B: AttendanceBackend>(
    args: BulkArgs,
    flags: &FeatureFlagBroadcast<B>,
    roster: &RosterDirectory<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    session.require_staff("set manual GPS")?;
    let enabled = args.enabled();

    let selection: BTreeSet<StudentId> = if args.students.is_empty() {
        if output.is_json() {
            return Err(CliError::new("No students given")
                .with_suggestion("List student ids: rollcall flags bulk S1 S2 --enable")
                .into());
        }
        pick_students(roster, args.search.as_deref().unwrap_or("")).await?
    } else {
        args.students.iter().map(StudentId::new).collect()
    };

    if selection.is_empty() {
        output.info("No students selected; nothing changed");
        return Ok(());
    }

    flags.set_bulk(session, &selection, enabled).await?;

    let students: Vec<String> = selection.iter().map(|id| id.to_string()).collect();
    if output.is_json() {
        output.result(BulkFlagOutput { enabled, students })?;
    } else {
        output.success(format!(
            "Manual GPS {} for {} student(s): {}",
            if enabled { "enabled" } else { "disabled" },
            students.len(),
            students.join(", ")
        ));
    }
    Ok(())
}

/// Interactive picker over the (optionally filtered) roster
async fn pick_students<B: AttendanceBackend>(
    roster: &RosterDirectory<B>,
    query: &str,
) -> Result<BTreeSet<StudentId>> {
    let students = roster.search(query).await?;
    if students.is_empty() {
        return Ok(BTreeSet::new());
    }

    let items: Vec<String> = students
        .iter()
        .map(|s| format!("{} ({})", s.name, s.student_id))
        .collect();
    let chosen = MultiSelect::new()
        .with_prompt("Select students (space to toggle, enter to confirm)")
        .items(&items)
        .interact()?;

    Ok(chosen
        .into_iter()
        .map(|i| students[i].student_id.clone())
        .collect())
}

async fn all<B: AttendanceBackend>(
    args: AllArgs,
    flags: &FeatureFlagBroadcast<B>,
    session: &SessionContext,
    output: &OutputWriter,
) -> Result<()> {
    session.require_staff("set manual GPS for all")?;
    let enabled = args.enabled();
    let word = if enabled { "enable" } else { "disable" };

    if !args.yes {
        if output.is_json() {
            return Err(CliError::new("Confirmation required")
                .with_suggestion("Pass --yes to change every student without a prompt")
                .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("{} manual GPS for every student?", capitalize(word)))
            .default(false)
            .interact()?;
        if !confirmed {
            output.info("Cancelled; nothing changed");
            return Ok(());
        }
    }

    flags.set_all(session, enabled).await?;

    if output.is_json() {
        output.result(BulkFlagOutput {
            enabled,
            students: Vec::new(),
        })?;
    } else {
        output.success(format!("Manual GPS {}d for all students", word));
    }
    Ok(())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
