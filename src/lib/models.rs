use std::{fmt::Display, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Deserializer};

use crate::run_tool::DEFAULT_LOOKAHEAD_DAYS;

pub mod student_model;

/// A model for describing ARGS of the tool.
/// Consists of:
/// 1. Path to the data directory, that holds students.json, introduction.html and the images embedded into the introduction letter.
/// 2. Path to the .env file with mail server credentials. When it is absent or empty, the process environment is used instead.
/// 3. The operation to run.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,
    #[arg(long, value_name = "FILE", default_value = ".env")]
    pub dotenv_path: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send the introduction letter to a new student
    Introduction {
        recipient: String,
        /// Image from the data directory referenced as cid:<NAME> in the template
        #[arg(long = "image", value_name = "NAME")]
        images: Vec<String>,
        /// Replace every [KEY] token of the template with VALUE
        #[arg(long = "replace", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },
    /// Send the calendar invite for the next lesson of a student
    CalendarEvent {
        student: String,
        /// Overwrite a field of the student for this letter only
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_key_value)]
        overrides: Vec<(String, String)>,
        /// Keep the stored occasion number as it is
        #[arg(long)]
        no_increment: bool,
    },
    /// Send calendar invites to every student whose lesson is exactly DAYS ahead
    Check {
        #[arg(long, default_value_t = DEFAULT_LOOKAHEAD_DAYS)]
        days: i64,
    },
}

/// A model for describing configuration of the tool.
/// Consists of:
/// 1. Email address from which the letters will be sent, also used as SMTP login
/// 2. Password for that account
/// 3. SMTP server address
/// 4. SMTP server port (implicit TLS)
/// 5. Sender display name, shown in the letter and as calendar organizer
/// 6. Course title used in subjects and calendar summaries
/// 7. Name the invite letters are signed with
#[derive(Deserialize)]
pub struct Config {
    pub email_address: String,
    pub email_password: String,
    pub host: String,
    #[serde(deserialize_with = "number_or_string")]
    pub port: u16,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_course_title")]
    pub course_title: String,
    #[serde(default = "default_signature")]
    pub signature: String,
}

fn default_sender_name() -> String {
    "PythonVilág".to_owned()
}

fn default_course_title() -> String {
    "Python Programozás".to_owned()
}

fn default_signature() -> String {
    "Dani".to_owned()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

/// Hand-edited files store numbers both as `5` and as `"5"`, accept either.
pub fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::String(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub fn parse_key_value(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", pair)),
    }
}
