use serde::{Deserialize, Serialize};

use super::session::StudentId;
use super::window::{Day, TimeSlot, WindowKey};
use crate::error::Result;

/// One row of a student's timetable as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub course_name: String,
    pub day_of_week: String,
    pub time_start: String,
    pub time_end: String,
    #[serde(default)]
    pub classroom: Option<String>,
}

impl ScheduleEntry {
    /// Window this row belongs to
    pub fn window_key(&self) -> Result<WindowKey> {
        let day: Day = self.day_of_week.parse()?;
        let slot = TimeSlot::new(self.time_start.as_str(), self.time_end.as_str())?;
        Ok(WindowKey::new(day, slot, self.course_name.clone()))
    }

    pub fn falls_on(&self, day: Day) -> bool {
        self.day_of_week
            .parse::<Day>()
            .map(|d| d == day)
            .unwrap_or(false)
    }
}

/// A student as listed on the manual-GPS roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterStudent {
    pub id: i64,
    pub name: String,
    pub student_id: StudentId,
}

impl RosterStudent {
    /// Case-insensitive match on name or student id
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.student_id.as_str().to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            id: 1,
            course_name: "CS101".to_string(),
            day_of_week: "Monday".to_string(),
            time_start: "10:30".to_string(),
            time_end: "11:30".to_string(),
            classroom: Some("B-12".to_string()),
        }
    }

    #[test]
    fn test_window_key_from_entry() {
        let key = entry().window_key().unwrap();
        assert_eq!(key.snapshot_key(), "mon-10:30-11:30");
        assert_eq!(key.course, "CS101");
        assert!(entry().falls_on(Day::Mon));
        assert!(!entry().falls_on(Day::Tue));
    }

    #[test]
    fn test_roster_search() {
        let student = RosterStudent {
            id: 7,
            name: "Asha Rao".to_string(),
            student_id: StudentId::new("22CE041"),
        };
        assert!(student.matches("asha"));
        assert!(student.matches("ce04"));
        assert!(student.matches(""));
        assert!(!student.matches("ravi"));
    }
}
