use std::{fs, path::Path};

use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    Message,
};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    calendar_event::{lesson_summary, CALENDAR_ATTACHMENT_NAME},
    error::{LectureError, LectureResult},
    models::{student_model::StudentRecord, Config},
};

pub const STUDENTS_FILE: &str = "students.json";
pub const INTRODUCTION_TEMPLATE_FILE: &str = "introduction.html";
pub const INTRODUCTION_SUBJECT: &str = "Különóra információk";

/// An image read from the data directory, to be embedded into the HTML letter.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub name: String,
    pub content_id: String,
    pub bytes: Vec<u8>,
}

/// Collapses repeated keys into their last value, keeping the position where
/// each key first appeared.
pub fn ordered_replacements(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut ordered: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match ordered.iter_mut().find(|(known, _)| *known == key) {
            Some(entry) => entry.1 = value,
            None => ordered.push((key, value)),
        }
    }
    ordered
}

/* replace every [KEY] with its value in the given order,
tokens without a value stay as they are */
pub fn substitute_placeholders(template: &str, values: &[(String, String)]) -> String {
    values.iter().fold(template.to_owned(), |body, (key, value)| {
        body.replace(&format!("[{}]", key), value)
    })
}

/* point cid:<image name> references to the generated content ids */
pub fn rewire_image_references(body: &str, images: &[InlineImage]) -> String {
    images.iter().fold(body.to_owned(), |body, image| {
        body.replace(
            &format!("cid:{}", image.name),
            &format!("cid:{}", image.content_id),
        )
    })
}

fn image_content_type(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

fn sender_domain(config: &Config) -> &str {
    config
        .email_address
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .unwrap_or("localhost")
}

fn sender_mailbox(config: &Config) -> LectureResult<Mailbox> {
    Ok(Mailbox::new(
        Some(config.sender_name.clone()),
        config.email_address.parse()?,
    ))
}

pub fn read_introduction_template(data_dir: &Path) -> LectureResult<String> {
    let template_path = data_dir.join(INTRODUCTION_TEMPLATE_FILE);
    info!(
        "Reading introduction template from {}",
        std::path::absolute(&template_path)?.display()
    );
    fs::read_to_string(&template_path).map_err(|source| LectureError::Resource {
        path: template_path,
        source,
    })
}

/// Reads the requested images from `data_dir`.
/// Images that cannot be read are skipped, the letter is sent without them.
pub fn load_inline_images(data_dir: &Path, names: &[String], domain: &str) -> Vec<InlineImage> {
    names
        .iter()
        .filter_map(|name| {
            let image_path = data_dir.join(name);
            match fs::read(&image_path) {
                Ok(bytes) => {
                    debug!("Embedding image {} ({} bytes)", name, bytes.len());
                    Some(InlineImage {
                        name: name.clone(),
                        content_id: format!("{}@{}", Uuid::new_v4().simple(), domain),
                        bytes,
                    })
                }
                Err(e) => {
                    warn!(
                        "Skipping image {}, cannot read {}: {}",
                        name,
                        image_path.display(),
                        e
                    );
                    None
                }
            }
        })
        .collect()
}

pub fn generate_introduction_email(
    config: &Config,
    recipient: &str,
    template: &str,
    values: &[(String, String)],
    images: &[InlineImage],
) -> LectureResult<Message> {
    let body = substitute_placeholders(template, values);
    let body = rewire_image_references(&body, images);

    let mut related = MultiPart::related().singlepart(SinglePart::html(body));
    for image in images {
        related = related.singlepart(
            Attachment::new_inline(image.content_id.clone()).body(
                image.bytes.clone(),
                ContentType::parse(image_content_type(&image.name))?,
            ),
        );
    }

    let email = Message::builder()
        .from(sender_mailbox(config)?)
        .to(Mailbox::new(None, recipient.parse()?))
        .subject(INTRODUCTION_SUBJECT)
        .multipart(related)?;

    Ok(email)
}

/// Builds the introduction letter from the template and images in `data_dir`.
pub fn compose_introduction_email(
    config: &Config,
    data_dir: &Path,
    recipient: &str,
    image_names: &[String],
    values: &[(String, String)],
) -> LectureResult<Message> {
    let template = read_introduction_template(data_dir)?;
    let images = load_inline_images(data_dir, image_names, sender_domain(config));
    generate_introduction_email(config, recipient, &template, values, &images)
}

pub fn calendar_email_body(config: &Config, student: &StudentRecord) -> String {
    format!(
        "Kedves {}!

A levélhez csatolva küldöm a következő óra naptári eseményét.
A korábbi órák tartalmát megtalálod az alábbi linken:
{}

Üdvözlettel,
{}
",
        student.name, student.content_link, config.signature
    )
}

pub fn generate_calendar_email(
    config: &Config,
    student: &StudentRecord,
    calendar: &str,
) -> LectureResult<Message> {
    let invite = Attachment::new(CALENDAR_ATTACHMENT_NAME.to_owned()).body(
        calendar.to_owned(),
        ContentType::parse("text/calendar; charset=utf-8")?,
    );

    let email = Message::builder()
        .from(sender_mailbox(config)?)
        .to(Mailbox::new(
            Some(student.name.clone()),
            student.email.parse()?,
        ))
        .subject(lesson_summary(&config.course_title, student))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(calendar_email_body(config, student)))
                .singlepart(invite),
        )?;

    Ok(email)
}

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;
