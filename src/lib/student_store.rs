use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Value};

use crate::{
    error::{LectureError, LectureResult},
    models::{number_or_string, student_model::StudentRecord},
};

/// A trait, necessary for every entity that keeps the students.
///
/// Implementations are not safe for concurrent writers: two processes
/// updating the same store at once may lose one of the updates.
pub trait StudentStore {
    /// Every stored student name with the weekday index of its lessons, in
    /// store order. Only the `day` field is read, so a student whose record
    /// is otherwise broken still shows up; an unreadable `day` is reported
    /// for that student alone.
    fn lesson_days(&self) -> LectureResult<Vec<(String, LectureResult<u8>)>>;

    fn get(&self, name: &str) -> LectureResult<StudentRecord>;

    /// Applies `mutator` to the student and persists the result.
    /// Returns the student as it was before the change.
    /// When `mutator` fails nothing is written.
    fn update<F>(&mut self, name: &str, mutator: F) -> LectureResult<StudentRecord>
    where
        F: FnOnce(&mut StudentRecord) -> LectureResult<()>;

    /// Returns the student before incrementing, then stores `occasion_number + 1`.
    fn load_and_increment(&mut self, name: &str) -> LectureResult<StudentRecord> {
        self.update(name, |student| {
            student.occasion_number = student
                .occasion_number
                .checked_add(1)
                .ok_or_else(|| LectureError::invalid_record(name, "occasion number overflow"))?;
            Ok(())
        })
    }
}

/// Students kept in a single hand-edited JSON object, keyed by student name.
/// Rewrites keep the key order and every untouched value as it was.
pub struct JsonStudentStore {
    path: PathBuf,
}

impl JsonStudentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStudentStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> LectureResult<Map<String, Value>> {
        info!(
            "Reading students from {}",
            std::path::absolute(&self.path)?.display()
        );
        let students_file = File::open(&self.path).map_err(|source| LectureError::Resource {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(students_file))?)
    }
}

fn parse_student(name: &str, raw: &Value) -> LectureResult<StudentRecord> {
    serde_json::from_value(raw.clone())
        .map_err(|e| LectureError::invalid_record(name, e.to_string()))
}

#[derive(Deserialize)]
struct LessonDay {
    #[serde(deserialize_with = "number_or_string")]
    day: u8,
}

fn parse_lesson_day(name: &str, raw: &Value) -> LectureResult<u8> {
    serde_json::from_value::<LessonDay>(raw.clone())
        .map(|lesson| lesson.day)
        .map_err(|e| LectureError::invalid_record(name, e.to_string()))
}

/* write changed fields back in the representation the file used for them,
a counter kept as "5" stays a string */
fn patch_raw_student(
    raw: &mut Map<String, Value>,
    before: &StudentRecord,
    after: &StudentRecord,
) -> LectureResult<()> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;
    let Some(after) = after.as_object() else {
        return Ok(());
    };

    for (field, new_value) in after {
        if before.get(field) == Some(new_value) {
            continue;
        }
        let kept_as_string = matches!(raw.get(field), Some(Value::String(_)));
        let new_value = match new_value {
            Value::Number(number) if kept_as_string => Value::String(number.to_string()),
            other => other.clone(),
        };
        raw.insert(field.clone(), new_value);
    }

    Ok(())
}

fn to_pretty_json(students: &Map<String, Value>) -> LectureResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    students.serialize(&mut serializer)?;
    Ok(buffer)
}

impl StudentStore for JsonStudentStore {
    fn lesson_days(&self) -> LectureResult<Vec<(String, LectureResult<u8>)>> {
        let students = self.read_all()?;
        debug!("Found {} students", students.len());
        Ok(students
            .iter()
            .map(|(name, raw)| (name.clone(), parse_lesson_day(name, raw)))
            .collect())
    }

    fn get(&self, name: &str) -> LectureResult<StudentRecord> {
        let students = self.read_all()?;
        let raw = students
            .get(name)
            .ok_or_else(|| LectureError::NotFound(name.to_owned()))?;
        parse_student(name, raw)
    }

    fn update<F>(&mut self, name: &str, mutator: F) -> LectureResult<StudentRecord>
    where
        F: FnOnce(&mut StudentRecord) -> LectureResult<()>,
    {
        /* read, change and rewrite within one open file */
        let mut students_file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| LectureError::Resource {
                path: self.path.clone(),
                source,
            })?;
        let mut content = String::new();
        students_file.read_to_string(&mut content)?;
        let mut students: Map<String, Value> = serde_json::from_str(&content)?;

        let raw = students
            .get_mut(name)
            .ok_or_else(|| LectureError::NotFound(name.to_owned()))?;
        let before = parse_student(name, raw)?;
        let mut after = before.clone();
        mutator(&mut after)?;

        let Value::Object(raw_fields) = raw else {
            return Err(LectureError::invalid_record(name, "student is not a JSON object"));
        };
        patch_raw_student(raw_fields, &before, &after)?;

        let new_content = to_pretty_json(&students)?;
        students_file.seek(SeekFrom::Start(0))?;
        students_file.write_all(&new_content)?;
        students_file.set_len(new_content.len() as u64)?;
        students_file.flush()?;

        info!(
            "Updated student {} in {}",
            name,
            std::path::absolute(&self.path)?.display()
        );
        Ok(before)
    }
}
