use console::style;
use rollcall_core::error::AttendanceError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Acting role is missing an identifier the command needs
pub fn student_required(command: &str) -> CliError {
    CliError::new("No student selected")
        .with_context(format!("'{}' acts on one student.", command))
        .with_suggestion("Act as the student: --as student:<ID>")
        .with_suggestion("Or name the student explicitly on the command line")
        .with_help(format!("Run: rollcall {} --help", command))
}

/// Window not on the acting student's timetable
pub fn class_not_scheduled(window: &str) -> CliError {
    CliError::new("Class not on your schedule")
        .with_context(format!("No schedule row matches {}.", window))
        .with_suggestion("List your classes: rollcall schedule")
        .with_suggestion("Check --day, --slot, and --course against the list")
}

/// Device path chosen without a location fix
pub fn no_location_fix() -> CliError {
    CliError::new("No device location")
        .with_context("The device path needs a fix from the location sensor.")
        .with_suggestion("Pass the sensor reading: --device-lat <LAT> --device-lon <LON>")
        .with_suggestion("Or, if manual GPS is enabled for you: --manual-lat <LAT> --manual-lon <LON>")
        .with_help("Run: rollcall attend --help")
}

pub fn image_unreadable(path: &str, reason: &str) -> CliError {
    CliError::new("Image file not readable")
        .with_context(format!("Path: {}\nError: {}", path, reason))
        .with_suggestion("Check the file path and try again")
}

/// Map a domain error to a message with next steps
pub fn from_attendance(error: &AttendanceError) -> CliError {
    let message = error.to_string();
    match error {
        AttendanceError::Network { .. } => CliError::new("Cannot reach the attendance server")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the server URL: rollcall config")
            .with_suggestion("Set it: --server <URL> or ROLLCALL_SERVER_URL")
            .with_suggestion("Or try the demo campus: --backend memory"),
        AttendanceError::Timeout { .. } => CliError::new("The server did not answer in time")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Retry the command")
            .with_suggestion("Or allow longer: --timeout <SECS>"),
        AttendanceError::Server { status, .. } => {
            CliError::new(format!("Server error ({})", status)).with_context(format!("Error: {}", message))
        }
        AttendanceError::Unauthorized { .. } => CliError::new("Not allowed for this role")
            .with_context(message)
            .with_suggestion("Choose the acting role: --as student:<ID>, --as teacher:<ID>, or --as admin"),
        AttendanceError::PermissionDenied { .. } => CliError::new("Permission denied")
            .with_context(message)
            .with_suggestion("Grant the permission on the device and try again"),
        AttendanceError::Validation { .. } => CliError::new("Invalid input").with_context(message),
        AttendanceError::WindowStateIndeterminate { .. } => {
            CliError::new("Window state unknown")
                .with_context(message)
                .with_suggestion("Set the state explicitly: rollcall window set --open|--close ...")
        }
        AttendanceError::ActionNotOffered { reason } => CliError::new("Action not available")
            .with_context(reason.clone())
            .with_suggestion("See what your schedule offers: rollcall schedule"),
        AttendanceError::AttemptInProgress { .. } => CliError::new("Attempt already running")
            .with_context(message)
            .with_suggestion("Wait for the current attempt to finish"),
        AttendanceError::ConfigInvalid { key, reason } => {
            CliError::new(format!("Invalid configuration: {}", key))
                .with_context(format!("Reason: {}", reason))
                .with_suggestion("Check rollcall.toml and ROLLCALL_* variables")
                .with_help("Run: rollcall config")
        }
        _ => CliError::new(message),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli) => return cli,
        Err(other) => other,
    };

    if let Some(attendance) = error.downcast_ref::<AttendanceError>() {
        return from_attendance(attendance);
    }

    let message = error.to_string();
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else {
        CliError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_get_suggestions() {
        let err = from_anyhow(anyhow::Error::new(AttendanceError::network(
            "toggle attendance",
            "connection refused",
        )));
        assert_eq!(err.message, "Cannot reach the attendance server");
        assert!(!err.suggestions.is_empty());
    }

    #[test]
    fn test_cli_error_passes_through() {
        let err = from_anyhow(anyhow::Error::new(no_location_fix()));
        assert_eq!(err.message, "No device location");
    }

    #[test]
    fn test_unknown_errors_keep_message() {
        let err = from_anyhow(anyhow::anyhow!("something odd"));
        assert_eq!(err.message, "something odd");
        assert!(err.suggestions.is_empty());
    }
}
