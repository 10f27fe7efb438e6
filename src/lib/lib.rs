//! Introduction letters and calendar invites for private-lecture students.

pub mod calendar_event;
pub mod config;
pub mod error;
pub mod helpers;
pub mod letter_sender;
pub mod models;
pub mod run_tool;
pub mod student_store;
