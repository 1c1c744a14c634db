//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod device;
pub mod service;

pub use device::{Camera, LocationSensor, PermissionStatus, PositionFix};
pub use service::{FlagService, RosterService, TuningService, VerificationService, WindowService};
