use std::path::Path;

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use super::{
    calendar_event::{create_calendar_event, days_until_lesson_day, Organizer},
    error::LectureResult,
    helpers::{compose_introduction_email, generate_calendar_email},
    letter_sender::LetterSender,
    models::{
        student_model::{RecordOverrides, StudentRecord},
        Config,
    },
    student_store::StudentStore,
};

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 5;

/// Sends the introduction letter built from the HTML template of `data_dir`.
/// Images missing from `data_dir` are left out of the letter.
pub fn send_introduction_email<LS: LetterSender>(
    letter_sender: &LS,
    config: &Config,
    data_dir: &Path,
    recipient: &str,
    images: &[String],
    values: &[(String, String)],
) -> LectureResult<()> {
    let email = compose_introduction_email(config, data_dir, recipient, images, values)?;
    letter_sender.send_letter(&email)?;
    info!("Sent introduction email to {}", recipient);
    Ok(())
}

/// Sends the invite for the next lesson of `student_name`.
/// `overrides` change this letter only; the stored occasion number is
/// incremented once the invite is generated, unless `increment` is false.
/// Returns the student as written into the letter.
pub fn send_calendar_event<SS: StudentStore, LS: LetterSender>(
    student_store: &mut SS,
    letter_sender: &LS,
    config: &Config,
    student_name: &str,
    overrides: &RecordOverrides,
    increment: bool,
    now: NaiveDateTime,
) -> LectureResult<StudentRecord> {
    let mut student = student_store.get(student_name)?;
    if !overrides.is_empty() {
        debug!("Overriding {:?} for {}", overrides, student_name);
        overrides.apply(&mut student);
    }

    let organizer = Organizer {
        email: &config.email_address,
        name: &config.sender_name,
    };
    let calendar = create_calendar_event(&student, &organizer, &config.course_title, now)?;
    let email = generate_calendar_email(config, &student, &calendar)?;

    if increment {
        student_store.load_and_increment(student_name)?;
    }
    letter_sender.send_letter(&email)?;
    info!(
        "Sent calendar event {} to {}",
        student.occasion_number, student_name
    );

    Ok(student)
}

/// Sends invites to every student whose next lesson is exactly
/// `lookahead_days` away. Returns the names the invites were sent to.
/// Students whose lesson day cannot be read are skipped with a warning;
/// a due student with a broken record stops the check with its error.
pub fn check_calendar_event<SS: StudentStore, LS: LetterSender>(
    student_store: &mut SS,
    letter_sender: &LS,
    config: &Config,
    lookahead_days: i64,
    now: NaiveDateTime,
) -> LectureResult<Vec<String>> {
    let lesson_days = student_store.lesson_days()?;
    info!(
        "Checking {} students for lessons in {} days",
        lesson_days.len(),
        lookahead_days
    );

    let mut notified = Vec::new();
    for (student_name, day) in lesson_days {
        /* only the day decides who is due, other broken fields fail on send */
        let days_ahead = match day.and_then(|day| days_until_lesson_day(&student_name, day, now)) {
            Ok(days_ahead) => days_ahead,
            Err(e) => {
                warn!("Skipping {}: {}", student_name, e);
                continue;
            }
        };
        debug!("Next lesson of {} is in {} days", student_name, days_ahead);
        if days_ahead != lookahead_days {
            continue;
        }
        send_calendar_event(
            student_store,
            letter_sender,
            config,
            &student_name,
            &RecordOverrides::default(),
            true,
            now,
        )?;
        notified.push(student_name);
    }

    Ok(notified)
}
