//! Rollcall Geo - Location acquisition and coordinate handling
//!
//! This crate turns device fixes and hand-typed coordinates into validated
//! location samples, and models campus geofences for the in-memory service.

pub mod fixed;
pub mod geofence;
pub mod provider;
pub mod validation;

pub use fixed::FixedLocationSensor;
pub use geofence::Geofence;
pub use provider::LocationProvider;
pub use validation::{parse_coordinate, parse_manual_coordinates};
