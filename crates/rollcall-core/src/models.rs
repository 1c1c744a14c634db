pub mod capture;
pub mod flags;
pub mod location;
pub mod schedule;
pub mod session;
pub mod window;

pub use capture::{CameraFacing, CaptureArtifact, Frame, RecognitionVerdict, TrainingImage};
pub use flags::{FlagKey, FlagSnapshot};
pub use location::{Coordinates, GeofenceVerdict, LocationSample, LocationSource};
pub use schedule::{RosterStudent, ScheduleEntry};
pub use session::{Role, SessionContext, StudentId, TeacherId};
pub use window::{Day, TimeSlot, WindowKey, WindowSnapshot, WindowState};
