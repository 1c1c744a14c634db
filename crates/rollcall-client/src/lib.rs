//! Rollcall Client - Adapters for the remote attendance service
//!
//! `HttpAttendanceClient` talks to the real server over HTTP. The in-memory
//! service implements the same ports for development and tests.

pub mod http;
pub mod memory;
pub mod wire;

pub use http::HttpAttendanceClient;
pub use memory::{AttendanceRecord, MemoryAttendanceService};
