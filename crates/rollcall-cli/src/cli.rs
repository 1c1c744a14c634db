use clap::{Args, Parser, Subcommand};
use rollcall_core::config::{parse_jpeg_quality, parse_server_url, parse_timeout_secs};
use rollcall_core::models::{CameraFacing, Day, SessionContext, TimeSlot, WindowKey};
use std::path::PathBuf;
use std::str::FromStr;

/// Rollcall - Campus attendance client
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(about = "Campus attendance client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Who is acting: student:<ID>, teacher:<ID>, or admin
    #[arg(long = "as", global = true, value_name = "ROLE", default_value = "admin")]
    pub role: RoleArg,

    /// Attendance service to talk to
    #[arg(long, global = true, default_value = "http")]
    pub backend: Backend,

    /// Configuration file (defaults to ./rollcall.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Server base URL, overriding configuration
    #[arg(long, global = true, value_name = "URL", value_parser = parse_url_arg)]
    pub server: Option<String>,

    /// Per-request timeout in seconds, overriding configuration
    #[arg(long, global = true, value_name = "SECS", value_parser = parse_timeout_arg)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Attendance service selection
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Backend {
    /// The attendance server over HTTP
    Http,
    /// A seeded in-process campus (for trying things out)
    Memory,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a student's schedule and which actions each class offers
    Schedule(ScheduleArgs),

    /// Open, close, or inspect attendance windows
    Window(WindowArgs),

    /// Read and change feature flags
    Flags(FlagsArgs),

    /// List or search registered students
    Roster(RosterArgs),

    /// Mark attendance: verify location, capture, and submit
    Attend(AttendArgs),

    /// Recognition-model tuning
    Tune(TuneArgs),

    /// Show effective configuration and where each value came from
    Config,
}

/// Acting role, parsed from `student:<ID>`, `teacher:<ID>`, or `admin`
#[derive(Debug, Clone)]
pub struct RoleArg(pub SessionContext);

impl FromStr for RoleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("admin") {
            return Ok(RoleArg(SessionContext::admin()));
        }

        match s.split_once(':') {
            Some((role, id)) if !id.trim().is_empty() => match role.to_lowercase().as_str() {
                "student" => Ok(RoleArg(SessionContext::student(id.trim()))),
                "teacher" => Ok(RoleArg(SessionContext::teacher(id.trim()))),
                other => Err(format!("Unknown role '{}'", other)),
            },
            _ => Err(format!(
                "Invalid role '{}'. Use student:<ID>, teacher:<ID>, or admin",
                s
            )),
        }
    }
}

/// Day, period, and course naming one attendance window
#[derive(Args, Debug, Clone)]
pub struct WindowSelector {
    /// Day of the week (mon, tue, ... or Monday)
    #[arg(long)]
    pub day: Day,

    /// Period as start-end (e.g., 10:30-11:30)
    #[arg(long, value_name = "START-END")]
    pub slot: TimeSlot,

    /// Course name
    #[arg(long)]
    pub course: String,
}

impl WindowSelector {
    pub fn key(&self) -> WindowKey {
        WindowKey::new(self.day, self.slot.clone(), self.course.clone())
    }
}

#[derive(Parser, Debug)]
pub struct ScheduleArgs {
    /// Only show classes on this day
    #[arg(long)]
    pub day: Option<Day>,
}

#[derive(Parser, Debug)]
pub struct WindowArgs {
    #[command(subcommand)]
    pub command: WindowCommand,
}

#[derive(Subcommand, Debug)]
pub enum WindowCommand {
    /// Invert a window: open it if closed, close it if open
    Toggle(WindowToggleArgs),

    /// Put a window into a given state
    Set(WindowSetArgs),

    /// Show the window states visible to a student
    Status(WindowStatusArgs),
}

#[derive(Parser, Debug)]
pub struct WindowToggleArgs {
    #[command(flatten)]
    pub window: WindowSelector,

    /// Read the current state through this student's view before toggling
    #[arg(long, value_name = "STUDENT_ID")]
    pub via_student: Option<String>,
}

#[derive(Parser, Debug)]
pub struct WindowSetArgs {
    #[command(flatten)]
    pub window: WindowSelector,

    /// Open the window
    #[arg(long, conflicts_with = "close", required_unless_present = "close")]
    pub open: bool,

    /// Close the window
    #[arg(long)]
    pub close: bool,
}

#[derive(Parser, Debug)]
pub struct WindowStatusArgs {
    /// Student whose view to read (defaults to the acting student)
    #[arg(long, value_name = "STUDENT_ID")]
    pub student: Option<String>,
}

#[derive(Parser, Debug)]
pub struct FlagsArgs {
    #[command(subcommand)]
    pub command: FlagsCommand,
}

#[derive(Subcommand, Debug)]
pub enum FlagsCommand {
    /// Show or toggle the model-tuning flag
    Tuning(TuningFlagArgs),

    /// Show or toggle one student's manual-GPS flag
    ManualGps(ManualGpsArgs),

    /// Set manual GPS for selected students
    Bulk(BulkArgs),

    /// Set manual GPS for every student
    All(AllArgs),
}

#[derive(Parser, Debug)]
pub struct TuningFlagArgs {
    /// Invert the flag (admin only)
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Parser, Debug)]
pub struct ManualGpsArgs {
    /// Student id (defaults to the acting student)
    pub student: Option<String>,

    /// Invert the flag (teachers and admins)
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Parser, Debug)]
pub struct BulkArgs {
    /// Student ids; omit to pick interactively from the roster
    pub students: Vec<String>,

    /// Enable manual GPS
    #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
    pub enable: bool,

    /// Disable manual GPS
    #[arg(long)]
    pub disable: bool,

    /// Narrow the interactive picker to matching students
    #[arg(long)]
    pub search: Option<String>,
}

impl BulkArgs {
    pub fn enabled(&self) -> bool {
        self.enable && !self.disable
    }
}

#[derive(Parser, Debug)]
pub struct AllArgs {
    /// Enable manual GPS
    #[arg(long, conflicts_with = "disable", required_unless_present = "disable")]
    pub enable: bool,

    /// Disable manual GPS
    #[arg(long)]
    pub disable: bool,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl AllArgs {
    pub fn enabled(&self) -> bool {
        self.enable && !self.disable
    }
}

#[derive(Parser, Debug)]
pub struct RosterArgs {
    /// Case-insensitive match on name or student id
    pub query: Option<String>,
}

#[derive(Parser, Debug)]
pub struct AttendArgs {
    #[command(flatten)]
    pub window: WindowSelector,

    /// Image file the camera "captures"
    #[arg(long, value_name = "PATH")]
    pub image: PathBuf,

    /// Image used when the front camera is selected
    #[arg(long, value_name = "PATH")]
    pub front_image: Option<PathBuf>,

    /// Switch cameras before capturing
    #[arg(long)]
    pub flip: bool,

    /// Device latitude reported by the location sensor
    #[arg(long, allow_hyphen_values = true, requires = "device_lon")]
    pub device_lat: Option<f64>,

    /// Device longitude reported by the location sensor
    #[arg(long, allow_hyphen_values = true, requires = "device_lat")]
    pub device_lon: Option<f64>,

    /// Enter latitude by hand (manual GPS path)
    #[arg(long, allow_hyphen_values = true, requires = "manual_lon", conflicts_with = "device_lat")]
    pub manual_lat: Option<String>,

    /// Enter longitude by hand (manual GPS path)
    #[arg(long, allow_hyphen_values = true, requires = "manual_lat")]
    pub manual_lon: Option<String>,

    /// JPEG quality for the uploaded capture (1-100)
    #[arg(long, value_parser = parse_quality_arg)]
    pub quality: Option<u8>,

    /// Camera to start with
    #[arg(long)]
    pub camera: Option<CameraFacing>,
}

#[derive(Parser, Debug)]
pub struct TuneArgs {
    #[command(subcommand)]
    pub command: TuneCommand,
}

#[derive(Subcommand, Debug)]
pub enum TuneCommand {
    /// Upload training images for a student
    Upload(TuneUploadArgs),

    /// Check whether an image is recognized as a student
    Test(TuneTestArgs),
}

#[derive(Parser, Debug)]
pub struct TuneUploadArgs {
    /// Student id the images belong to
    pub student: String,

    /// Image files (JPEG or PNG)
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct TuneTestArgs {
    /// Student id to test against
    pub student: String,

    /// Image file to recognize
    pub image: PathBuf,
}

fn parse_url_arg(s: &str) -> Result<String, String> {
    parse_server_url(s).map_err(|e| e.to_string())
}

fn parse_timeout_arg(s: &str) -> Result<u64, String> {
    parse_timeout_secs(s).map_err(|e| e.to_string())
}

fn parse_quality_arg(s: &str) -> Result<u8, String> {
    parse_jpeg_quality(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rollcall_core::models::Role;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_role_parsing() {
        assert!(matches!(
            "student:S1".parse::<RoleArg>().unwrap().0.role,
            Role::Student { .. }
        ));
        assert!(matches!(
            "Teacher:T9".parse::<RoleArg>().unwrap().0.role,
            Role::Teacher { .. }
        ));
        assert!(matches!("admin".parse::<RoleArg>().unwrap().0.role, Role::Admin));
        assert!("student:".parse::<RoleArg>().is_err());
        assert!("janitor:J1".parse::<RoleArg>().is_err());
    }

    #[test]
    fn test_attend_args() {
        let cli = Cli::try_parse_from([
            "rollcall",
            "--as",
            "student:S1",
            "attend",
            "--day",
            "mon",
            "--slot",
            "10:30-11:30",
            "--course",
            "CS101",
            "--image",
            "face.jpg",
            "--device-lat",
            "12.97",
            "--device-lon",
            "77.59",
        ])
        .unwrap();

        match cli.command {
            Commands::Attend(args) => {
                assert_eq!(args.window.key().snapshot_key(), "mon-10:30-11:30");
                assert_eq!(args.device_lat, Some(12.97));
                assert!(args.manual_lat.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_window_set_needs_a_state() {
        let base = [
            "rollcall", "window", "set", "--day", "mon", "--slot", "10:30-11:30", "--course",
            "CS101",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let mut open = base.to_vec();
        open.push("--open");
        assert!(Cli::try_parse_from(open).is_ok());
    }
}
