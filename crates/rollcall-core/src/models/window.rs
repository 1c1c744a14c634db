//! Attendance windows: the open/closed state of one class period.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AttendanceError, Result};

/// Day of the week a class period falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
        Day::Sun,
    ];

    /// Short code used in window keys (e.g. "mon")
    pub fn code(&self) -> &'static str {
        match self {
            Day::Mon => "mon",
            Day::Tue => "tue",
            Day::Wed => "wed",
            Day::Thu => "thu",
            Day::Fri => "fri",
            Day::Sat => "sat",
            Day::Sun => "sun",
        }
    }

    /// Full name used by schedule entries (e.g. "Monday")
    pub fn full_name(&self) -> &'static str {
        match self {
            Day::Mon => "Monday",
            Day::Tue => "Tuesday",
            Day::Wed => "Wednesday",
            Day::Thu => "Thursday",
            Day::Fri => "Friday",
            Day::Sat => "Saturday",
            Day::Sun => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Day {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        Day::ALL
            .iter()
            .copied()
            .find(|day| lower == day.code() || lower == day.full_name().to_lowercase())
            .ok_or_else(|| {
                AttendanceError::validation("day", format!("Unknown day '{}'", s.trim()))
            })
    }
}

/// Start and end of a class period, as printed on the timetable (e.g. "10:30", "11:30")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let start = start.into().trim().to_string();
        let end = end.into().trim().to_string();
        if start.is_empty() || end.is_empty() {
            return Err(AttendanceError::validation(
                "time slot",
                "start and end times are required",
            ));
        }
        if start.contains('-') || end.contains('-') {
            return Err(AttendanceError::validation(
                "time slot",
                "times must not contain '-'",
            ));
        }
        Ok(Self { start, end })
    }

    /// Period string sent to the server (e.g. "10:30-11:30")
    pub fn period(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl FromStr for TimeSlot {
    type Err = AttendanceError;

    /// Parse a "start-end" period string
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            Some((start, end)) => TimeSlot::new(start, end),
            None => Err(AttendanceError::validation(
                "time slot",
                format!("Expected 'start-end', got '{}'", s),
            )),
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Composite identity of an attendance window
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowKey {
    pub day: Day,
    pub slot: TimeSlot,
    pub course: String,
}

impl WindowKey {
    pub fn new(day: Day, slot: TimeSlot, course: impl Into<String>) -> Self {
        Self {
            day,
            slot,
            course: course.into(),
        }
    }

    /// Key used in the server's snapshot mapping: day, start and end joined by '-'.
    ///
    /// The course is not part of this key; the server tracks one window per period.
    pub fn snapshot_key(&self) -> String {
        format!("{}-{}", self.day.code(), self.slot.period())
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.day, self.slot, self.course)
    }
}

/// Whether a window is accepting attendance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowState {
    Open,
    #[default]
    Closed,
}

impl WindowState {
    pub fn from_open(is_open: bool) -> Self {
        if is_open {
            WindowState::Open
        } else {
            WindowState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, WindowState::Open)
    }

    pub fn inverted(&self) -> Self {
        match self {
            WindowState::Open => WindowState::Closed,
            WindowState::Closed => WindowState::Open,
        }
    }

    /// Label of the teacher's action button for a window in this state
    pub fn action_label(&self) -> &'static str {
        match self {
            WindowState::Open => "End Attendance",
            WindowState::Closed => "Take Attendance",
        }
    }
}

/// Point-in-time copy of the server's window mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub windows: HashMap<String, bool>,
    pub fetched_at: DateTime<Utc>,
}

impl WindowSnapshot {
    pub fn new(windows: HashMap<String, bool>) -> Self {
        Self {
            windows,
            fetched_at: Utc::now(),
        }
    }

    /// Missing keys are closed
    pub fn is_open(&self, key: &WindowKey) -> bool {
        self.windows.get(&key.snapshot_key()).copied().unwrap_or(false)
    }

    pub fn state(&self, key: &WindowKey) -> WindowState {
        WindowState::from_open(self.is_open(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs101_monday() -> WindowKey {
        WindowKey::new(Day::Mon, TimeSlot::new("10:30", "11:30").unwrap(), "CS101")
    }

    #[test]
    fn test_snapshot_key_format() {
        assert_eq!(cs101_monday().snapshot_key(), "mon-10:30-11:30");
    }

    #[test]
    fn test_day_parsing() {
        assert_eq!("mon".parse::<Day>().unwrap(), Day::Mon);
        assert_eq!("Monday".parse::<Day>().unwrap(), Day::Mon);
        assert_eq!(" SATURDAY ".parse::<Day>().unwrap(), Day::Sat);
        assert!("someday".parse::<Day>().is_err());
    }

    #[test]
    fn test_time_slot_parsing() {
        let slot: TimeSlot = "12:30-1:30".parse().unwrap();
        assert_eq!(slot.start, "12:30");
        assert_eq!(slot.end, "1:30");
        assert_eq!(slot.period(), "12:30-1:30");
        assert!("12:30".parse::<TimeSlot>().is_err());
        assert!(TimeSlot::new("", "1:30").is_err());
    }

    #[test]
    fn test_missing_key_is_closed() {
        let snapshot = WindowSnapshot::new(HashMap::new());
        assert!(!snapshot.is_open(&cs101_monday()));
        assert_eq!(snapshot.state(&cs101_monday()), WindowState::Closed);
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut windows = HashMap::new();
        windows.insert("mon-10:30-11:30".to_string(), true);
        windows.insert("tue-10:30-11:30".to_string(), false);
        let snapshot = WindowSnapshot::new(windows);

        assert!(snapshot.is_open(&cs101_monday()));
        let tuesday = WindowKey::new(Day::Tue, TimeSlot::new("10:30", "11:30").unwrap(), "CS101");
        assert!(!snapshot.is_open(&tuesday));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(WindowState::Closed.action_label(), "Take Attendance");
        assert_eq!(WindowState::Open.action_label(), "End Attendance");
        assert_eq!(WindowState::Open.inverted(), WindowState::Closed);
    }
}
