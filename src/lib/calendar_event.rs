//! Next-lesson arithmetic and .ics generation for calendar invites.

use chrono::{Datelike, Duration, NaiveDateTime, Utc, Weekday};
use icalendar::{Calendar, Component, Property};
use uuid::Uuid;

use crate::{
    error::{LectureError, LectureResult},
    models::student_model::StudentRecord,
};

pub const CALENDAR_ATTACHMENT_NAME: &str = "event.ics";

/// Start and end of a single lesson, in local (floating) time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Sender of the invite, written into ORGANIZER.
pub struct Organizer<'a> {
    pub email: &'a str,
    pub name: &'a str,
}

/// 0 is Monday, 6 is Sunday.
pub fn weekday_from_index(day: u8) -> Option<Weekday> {
    Weekday::try_from(day).ok()
}

/// Days until the next lesson on `lesson_day`.
/// A lesson falling on `today` is always pushed to next week.
pub fn days_until(lesson_day: Weekday, today: Weekday) -> i64 {
    let days_ahead =
        i64::from(lesson_day.num_days_from_monday()) - i64::from(today.num_days_from_monday());
    if days_ahead <= 0 {
        days_ahead + 7
    } else {
        days_ahead
    }
}

/// Parses "HHMM" into (hour, minute).
pub fn parse_lesson_time(time: &str) -> Result<(u32, u32), String> {
    if time.len() != 4 || !time.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("time '{}' is not in HHMM format", time));
    }
    let hour: u32 = time[..2].parse().map_err(|e| format!("{}", e))?;
    let minute: u32 = time[2..].parse().map_err(|e| format!("{}", e))?;
    if hour > 23 || minute > 59 {
        return Err(format!("time '{}' is out of range", time));
    }
    Ok((hour, minute))
}

/// Days from `now` until the next lesson held on weekday index `day`.
/// `student` only names the record in the error.
pub fn days_until_lesson_day(student: &str, day: u8, now: NaiveDateTime) -> LectureResult<i64> {
    let lesson_day = weekday_from_index(day).ok_or_else(|| {
        LectureError::invalid_record(student, format!("day {} is not in 0..=6", day))
    })?;
    Ok(days_until(lesson_day, now.weekday()))
}

pub fn days_until_lesson(student: &StudentRecord, now: NaiveDateTime) -> LectureResult<i64> {
    days_until_lesson_day(&student.name, student.day, now)
}

pub fn next_lesson_slot(student: &StudentRecord, now: NaiveDateTime) -> LectureResult<LessonSlot> {
    let days_ahead = days_until_lesson(student, now)?;
    let (hour, minute) =
        parse_lesson_time(&student.time).map_err(|e| LectureError::invalid_record(&student.name, e))?;
    if student.duration == 0 {
        return Err(LectureError::invalid_record(
            &student.name,
            "duration must be positive",
        ));
    }

    let lesson_date = now.date() + Duration::days(days_ahead);
    let start = lesson_date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| LectureError::invalid_record(&student.name, "invalid lesson start"))?;
    let end = start + Duration::minutes(i64::from(student.duration));

    Ok(LessonSlot { start, end })
}

pub fn lesson_summary(course_title: &str, student: &StudentRecord) -> String {
    format!(
        "{} {} - {}",
        course_title, student.occasion_number, student.name
    )
}

fn lesson_description(student: &StudentRecord) -> String {
    format!(
        "A korábbi órák tartalmát megtalálod az alábbi linken:\n\n{}",
        student.content_link
    )
}

/// Builds the VCALENDAR text with a single VEVENT for the next lesson.
pub fn create_calendar_event(
    student: &StudentRecord,
    organizer: &Organizer,
    course_title: &str,
    now: NaiveDateTime,
) -> LectureResult<String> {
    let slot = next_lesson_slot(student, now)?;
    let domain = organizer
        .email
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("localhost");

    let mut event = icalendar::Event::new();
    event.uid(&format!("{}@{}", Uuid::new_v4(), domain));
    event.add_property("DTSTAMP", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());
    event.summary(&lesson_summary(course_title, student));
    event.description(&lesson_description(student));

    let mut organizer_prop = Property::new("ORGANIZER", format!("mailto:{}", organizer.email));
    organizer_prop.add_parameter("CN", organizer.name);
    event.append_property(organizer_prop);

    // Floating times, the lesson happens at the same wall-clock time wherever it is opened
    event.add_property("DTSTART", slot.start.format("%Y%m%dT%H%M%S").to_string());
    event.add_property("DTEND", slot.end.format("%Y%m%dT%H%M%S").to_string());

    let mut calendar = Calendar::new();
    calendar.push(event.done());

    Ok(calendar.done().to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const ALL_DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    fn student(day: u8, time: &str, duration: u32) -> StudentRecord {
        StudentRecord {
            name: "Kiss Anna".to_owned(),
            email: "anna@example.com".to_owned(),
            day,
            time: time.to_owned(),
            duration,
            occasion_number: 3,
            content_link: "https://example.com/anna".to_owned(),
        }
    }

    /* 2024-01-01 was a Monday */
    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 15, 42)
            .unwrap()
    }

    #[test]
    fn same_day_rolls_to_next_week() {
        for day in ALL_DAYS {
            assert_eq!(days_until(day, day), 7);
        }
    }

    #[test]
    fn days_until_is_always_between_one_and_seven() {
        for lesson_day in ALL_DAYS {
            for today in ALL_DAYS {
                let days = days_until(lesson_day, today);
                assert!((1..=7).contains(&days));
                let mut reached = today;
                for _ in 0..days {
                    reached = reached.succ();
                }
                assert_eq!(reached, lesson_day);
            }
        }
    }

    #[test]
    fn weekday_index_bounds() {
        assert_eq!(weekday_from_index(0), Some(Weekday::Mon));
        assert_eq!(weekday_from_index(6), Some(Weekday::Sun));
        assert_eq!(weekday_from_index(7), None);
    }

    #[test]
    fn parse_valid_times() {
        assert_eq!(parse_lesson_time("0000"), Ok((0, 0)));
        assert_eq!(parse_lesson_time("1430"), Ok((14, 30)));
        assert_eq!(parse_lesson_time("2359"), Ok((23, 59)));
        assert_eq!(parse_lesson_time("0905"), Ok((9, 5)));
    }

    #[test]
    fn parse_invalid_times() {
        for time in ["", "930", "14300", "2400", "1260", "14:3", "1a30", "+130", " 930"] {
            assert!(parse_lesson_time(time).is_err(), "{} should fail", time);
        }
    }

    #[test]
    fn wednesday_lesson_from_monday() {
        let slot = next_lesson_slot(&student(2, "1430", 60), monday_morning()).unwrap();
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(slot.start, wednesday.and_hms_opt(14, 30, 0).unwrap());
        assert_eq!(slot.end, wednesday.and_hms_opt(15, 30, 0).unwrap());
        assert_eq!(days_until_lesson(&student(2, "1430", 60), monday_morning()).unwrap(), 2);
    }

    #[test]
    fn lesson_today_is_scheduled_next_week() {
        /* lesson has not started yet today, still goes to next Monday */
        let slot = next_lesson_slot(&student(0, "1800", 90), monday_morning()).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(slot.start, next_monday.and_hms_opt(18, 0, 0).unwrap());
        assert_eq!(slot.end, next_monday.and_hms_opt(19, 30, 0).unwrap());
    }

    #[test]
    fn lesson_crossing_midnight() {
        let slot = next_lesson_slot(&student(6, "2330", 45), monday_morning()).unwrap();
        assert_eq!(
            slot.end,
            NaiveDate::from_ymd_opt(2024, 1, 8)
                .unwrap()
                .and_hms_opt(0, 15, 0)
                .unwrap()
        );
    }

    #[test]
    fn invalid_records_fail() {
        assert!(matches!(
            next_lesson_slot(&student(7, "1430", 60), monday_morning()),
            Err(LectureError::InvalidRecord { .. })
        ));
        assert!(matches!(
            next_lesson_slot(&student(2, "143", 60), monday_morning()),
            Err(LectureError::InvalidRecord { .. })
        ));
        assert!(matches!(
            next_lesson_slot(&student(2, "1430", 0), monday_morning()),
            Err(LectureError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn calendar_event_contents() {
        let organizer = Organizer {
            email: "tanar@example.com",
            name: "PythonVilág",
        };
        let ics = create_calendar_event(
            &student(2, "1430", 60),
            &organizer,
            "Python Programozás",
            monday_morning(),
        )
        .unwrap();
        let ics = ics.replace("\r\n ", "");

        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
        assert!(ics.contains("SUMMARY:Python Programozás 3 - Kiss Anna"));
        assert!(ics.contains("DTSTART:20240103T143000"));
        assert!(ics.contains("DTEND:20240103T153000"));
        assert!(ics.contains("mailto:tanar@example.com"));
        assert!(ics.contains("https://example.com/anna"));
        assert!(ics.contains("UID:"));
        assert!(ics.contains("DTSTAMP:"));
    }
}
