//! Attendance service selection for the CLI

use anyhow::Result;
use rollcall_client::{HttpAttendanceClient, MemoryAttendanceService};
use rollcall_core::config::LayeredConfig;
use rollcall_core::models::{Day, ScheduleEntry, StudentId, TimeSlot, WindowKey};
use rollcall_core::ports::{
    FlagService, RosterService, TuningService, VerificationService, WindowService,
};

/// Everything the commands need from an attendance service
pub trait AttendanceBackend:
    WindowService + FlagService + VerificationService + RosterService + TuningService + Clone + 'static
{
}

impl<T> AttendanceBackend for T where
    T: WindowService
        + FlagService
        + VerificationService
        + RosterService
        + TuningService
        + Clone
        + 'static
{
}

pub fn http(config: &LayeredConfig) -> Result<HttpAttendanceClient> {
    let client = HttpAttendanceClient::from_config(config)?;
    tracing::debug!(server = %client.base_url(), "Using attendance server");
    Ok(client)
}

/// A small campus living in this process only; changes vanish on exit
pub fn demo_campus() -> Result<MemoryAttendanceService> {
    let service = MemoryAttendanceService::default();

    let students = [(1, "S1", "Asha"), (2, "S2", "Bilal"), (3, "S3", "Chen")];
    for (id, student_id, name) in students {
        service.add_student(id, student_id, name);
        service.enroll(&StudentId::new(student_id), name);
    }

    let timetable = [
        (1, "CS101", Day::Mon, "10:30", "11:30", "B-204"),
        (2, "MA201", Day::Mon, "12:00", "13:00", "A-110"),
        (3, "PH150", Day::Wed, "09:00", "10:00", "Lab 3"),
    ];
    for (_, student_id, _) in students {
        let student_id = StudentId::new(student_id);
        for (id, course, day, start, end, room) in timetable {
            service.add_schedule(
                &student_id,
                ScheduleEntry {
                    id,
                    course_name: course.to_string(),
                    day_of_week: day.full_name().to_string(),
                    time_start: start.to_string(),
                    time_end: end.to_string(),
                    classroom: Some(room.to_string()),
                },
            );
        }
    }

    service.open_window(
        &WindowKey::new(Day::Mon, TimeSlot::new("10:30", "11:30")?, "CS101"),
        true,
    );

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_campus_seed() {
        let campus = demo_campus().unwrap();
        let cs101 = WindowKey::new(Day::Mon, TimeSlot::new("10:30", "11:30").unwrap(), "CS101");
        let ma201 = WindowKey::new(Day::Mon, TimeSlot::new("12:00", "13:00").unwrap(), "MA201");

        assert!(campus.window_open(&cs101));
        assert!(!campus.window_open(&ma201));
        assert!(!campus.manual_flag(&StudentId::new("S2")));
    }
}
