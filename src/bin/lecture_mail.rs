use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use lecture::{
    config::load_config,
    error::LectureResult,
    helpers::{ordered_replacements, STUDENTS_FILE},
    letter_sender::build_transport,
    models::{student_model::RecordOverrides, Args, Command},
    run_tool::{check_calendar_event, send_calendar_event, send_introduction_email},
    student_store::JsonStudentStore,
};
use log::{error, info};

fn run(args: Args) -> LectureResult<()> {
    /* Config errors must surface before any connection is attempted */
    let config = load_config(&args.dotenv_path)?;
    let sender = build_transport(&config)?;
    let now = Local::now().naive_local();

    match args.command {
        Command::Introduction {
            recipient,
            images,
            values,
        } => {
            let values = ordered_replacements(values);
            send_introduction_email(
                &sender,
                &config,
                &args.data_dir,
                &recipient,
                &images,
                &values,
            )
        }
        Command::CalendarEvent {
            student,
            overrides,
            no_increment,
        } => {
            let overrides = RecordOverrides::from_pairs(
                overrides.iter().map(|(key, value)| (key.as_str(), value.as_str())),
            )?;
            let mut store = JsonStudentStore::new(args.data_dir.join(STUDENTS_FILE));
            send_calendar_event(
                &mut store,
                &sender,
                &config,
                &student,
                &overrides,
                !no_increment,
                now,
            )
            .map(|_| ())
        }
        Command::Check { days } => {
            let mut store = JsonStudentStore::new(args.data_dir.join(STUDENTS_FILE));
            let notified = check_calendar_event(&mut store, &sender, &config, days, now)?;
            info!("Sent {} calendar events: {:?}", notified.len(), notified);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    /* Setup logging */
    env_logger::builder()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
