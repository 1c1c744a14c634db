//! Rollcall Session - Attendance-session lifecycle
//!
//! Window registry, feature flags, the action gate, and the coordinator that
//! drives one attendance attempt from location to recognition.

pub mod attempt;
mod call;
pub mod coordinator;
pub mod flags;
pub mod gate;
pub mod guard;
pub mod registry;
pub mod roster;
pub mod tuning;

pub use attempt::{Attempt, AttemptState, FailureReason};
pub use coordinator::{AttemptOutcome, AttemptReport, AttendanceSubmissionCoordinator, LocationPath};
pub use flags::FeatureFlagBroadcast;
pub use gate::{row_actions, AttendancePath, RowActions};
pub use guard::{InFlightGuard, InFlightSet};
pub use registry::{SessionWindowRegistry, ToggleState};
pub use roster::RosterDirectory;
pub use tuning::TuningFlows;
