use lettre::{
    transport::smtp::authentication::{Credentials, Mechanism},
    Message, SmtpTransport, Transport,
};
use log::info;

use crate::{
    error::{LectureError, LectureResult},
    models::Config,
};

/// A trait, necessary for every entity that will send the composed letters.
pub trait LetterSender {
    fn send_letter(&self, letter: &Message) -> LectureResult<()>;
}

/// Allows SmtpTransport to send letters via its native send method.
/// Built without a pool, so every letter opens its own session and closes it
/// once sent or failed.
impl LetterSender for SmtpTransport {
    fn send_letter(&self, letter: &Message) -> LectureResult<()> {
        let code = self
            .send(letter)
            .map_err(|e| LectureError::Transport(Box::new(e)))?;
        info!(
            "Sent email to {:?} with response {:?}",
            letter.envelope().to(),
            code
        );
        Ok(())
    }
}

/// SMTP over implicit TLS with password authentication.
pub fn build_transport(config: &Config) -> LectureResult<SmtpTransport> {
    let sender = SmtpTransport::relay(&config.host)
        .map_err(|e| LectureError::Transport(Box::new(e)))?
        .port(config.port)
        .credentials(Credentials::new(
            config.email_address.to_owned(),
            config.email_password.to_owned(),
        ))
        .authentication(vec![Mechanism::Plain, Mechanism::Login])
        .build();
    Ok(sender)
}
