//! Error type shared by every operation of the tool.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LectureError {
    #[error("Config variable is missing or malformed, check the .env file or the environment: {0}")]
    Config(String),

    #[error("Student '{0}' not found in the students file")]
    NotFound(String),

    #[error("Invalid record for student '{student}': {reason}")]
    InvalidRecord { student: String, reason: String },

    #[error("Unknown student field '{0}'")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidOverride {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot read {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Letter(#[from] lettre::error::Error),

    #[error("Invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("Failed to send email: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type LectureResult<T> = Result<T, LectureError>;

impl LectureError {
    pub(crate) fn invalid_record(student: &str, reason: impl Into<String>) -> Self {
        LectureError::InvalidRecord {
            student: student.to_owned(),
            reason: reason.into(),
        }
    }
}
