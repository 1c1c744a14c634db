//! Rollcall Core - Domain models, ports, and configuration
//!
//! This crate contains the attendance domain types and the port traits that
//! the HTTP client, device adapters, and session components are built on.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{AttendanceError, FailureKind, Result};
