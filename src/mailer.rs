//! Newsletter delivery.
//!
//! - [`Mailer`]: Delivery seam used by the pipeline
//! - [`SmtpMailer`]: Authenticated SMTP submission over STARTTLS via `lettre`
//! - [`PreviewMailer`]: Writes the HTML to disk instead of sending it

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Default submission host.
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
/// Default submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("could not write preview: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can deliver one HTML newsletter.
pub trait Mailer {
    /// Send `html` with `subject` from `from` to `to`, authenticating with
    /// `credential`.
    async fn deliver(
        &self,
        subject: &str,
        html: &str,
        from: &str,
        credential: &str,
        to: &str,
    ) -> Result<(), DeliveryError>;
}

/// SMTP submission with username/password auth over STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(server: &str, port: u16) -> Self {
        Self {
            server: server.to_string(),
            port,
        }
    }
}

/// Build the single-part HTML message.
pub fn build_message(
    subject: &str,
    html: &str,
    from: &str,
    to: &str,
) -> Result<Message, DeliveryError> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = to.parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html.to_string())?;
    Ok(message)
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(server = %self.server, port = self.port, %to))]
    async fn deliver(
        &self,
        subject: &str,
        html: &str,
        from: &str,
        credential: &str,
        to: &str,
    ) -> Result<(), DeliveryError> {
        let message = build_message(subject, html, from, to)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)?
            .port(self.port)
            .credentials(Credentials::new(from.to_string(), credential.to_string()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let response = transport.send(message).await?;
        info!(code = %response.code(), "Newsletter accepted by SMTP server");
        Ok(())
    }
}

/// Writes the newsletter to a file; used for dry runs.
#[derive(Debug, Clone)]
pub struct PreviewMailer {
    pub path: PathBuf,
}

impl Mailer for PreviewMailer {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn deliver(
        &self,
        subject: &str,
        html: &str,
        _from: &str,
        _credential: &str,
        to: &str,
    ) -> Result<(), DeliveryError> {
        tokio::fs::write(&self.path, html).await?;
        info!(%subject, %to, "Dry run: wrote newsletter preview instead of sending");
        Ok(())
    }
}
