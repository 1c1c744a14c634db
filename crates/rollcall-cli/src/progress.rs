use indicatif::{ProgressBar, ProgressStyle};
use rollcall_session::AttemptState;
use std::time::Duration;

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// A spinner that stays quiet in JSON mode
pub fn spinner_for(json: bool, message: &str) -> ProgressBar {
    if json {
        ProgressBar::hidden()
    } else {
        create_spinner(message)
    }
}

pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✗ {}", message));
}

/// Spinner line for each attempt step
pub fn attempt_step_message(state: &AttemptState) -> String {
    match state {
        AttemptState::NotStarted => "Starting attempt...".to_string(),
        AttemptState::LocationPending => "Checking location...".to_string(),
        AttemptState::LocationVerified => "Location verified".to_string(),
        AttemptState::Capturing => "Capturing photo...".to_string(),
        AttemptState::Uploading => "Recognizing...".to_string(),
        AttemptState::Succeeded { student_name } => format!("Recorded for {}", student_name),
        AttemptState::Failed(reason) => format!("Failed: {}", reason),
    }
}
