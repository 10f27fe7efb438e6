//! Module with the student model stored in students.json
use serde::{Deserialize, Serialize};

use crate::{
    calendar_event::{parse_lesson_time, weekday_from_index},
    error::{LectureError, LectureResult},
    models::number_or_string,
};

/// A model for describing a student of the private lectures.
/// Consists of:
/// 1. Student's name, written in the greeting and in the calendar summary
/// 2. Student's email address
/// 3. Weekday of the lesson, 0 is Monday and 6 is Sunday
/// 4. Start of the lesson as HHMM
/// 5. Length of the lesson in minutes
/// 6. Number of the next lesson, incremented after every sent invite
/// 7. Link to the materials of the previous lessons
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudentRecord {
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "number_or_string")]
    pub day: u8,
    pub time: String,
    #[serde(deserialize_with = "number_or_string")]
    pub duration: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub occasion_number: u32,
    pub content_link: String,
}

/// Temporary changes of a student applied to one outgoing invite only.
/// Every value is validated when it is set, so applying never fails.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordOverrides {
    pub name: Option<String>,
    pub email: Option<String>,
    pub day: Option<u8>,
    pub time: Option<String>,
    pub duration: Option<u32>,
    pub occasion_number: Option<u32>,
    pub content_link: Option<String>,
}

impl RecordOverrides {
    pub fn from_pairs<'a, I>(pairs: I) -> LectureResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = RecordOverrides::default();
        for (field, value) in pairs {
            overrides.set(field, value)?;
        }
        Ok(overrides)
    }

    pub fn set(&mut self, field: &str, value: &str) -> LectureResult<()> {
        let invalid = |reason: String| LectureError::InvalidOverride {
            field: field.to_owned(),
            value: value.to_owned(),
            reason,
        };

        match field {
            "name" => self.name = Some(value.to_owned()),
            "email" => self.email = Some(value.to_owned()),
            "content_link" => self.content_link = Some(value.to_owned()),
            "day" => {
                let day: u8 = value.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
                weekday_from_index(day).ok_or_else(|| invalid("day must be in 0..=6".to_owned()))?;
                self.day = Some(day);
            }
            "time" => {
                parse_lesson_time(value).map_err(invalid)?;
                self.time = Some(value.to_owned());
            }
            "duration" => {
                let duration: u32 = value.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
                if duration == 0 {
                    return Err(invalid("duration must be positive".to_owned()));
                }
                self.duration = Some(duration);
            }
            "occasion_number" => {
                let occasion: u32 = value.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
                self.occasion_number = Some(occasion);
            }
            unknown => return Err(LectureError::UnknownField(unknown.to_owned())),
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == RecordOverrides::default()
    }

    pub fn apply(&self, student: &mut StudentRecord) {
        if let Some(name) = &self.name {
            student.name = name.clone();
        }
        if let Some(email) = &self.email {
            student.email = email.clone();
        }
        if let Some(day) = self.day {
            student.day = day;
        }
        if let Some(time) = &self.time {
            student.time = time.clone();
        }
        if let Some(duration) = self.duration {
            student.duration = duration;
        }
        if let Some(occasion) = self.occasion_number {
            student.occasion_number = occasion;
        }
        if let Some(link) = &self.content_link {
            student.content_link = link.clone();
        }
    }
}
