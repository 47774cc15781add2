//! SMTP transport backed by lettre.
//!
//! Wraps `AsyncSmtpTransport` behind the [`MailTransport`] capability so
//! the sender never sees provider specifics. One connection pool is shared
//! read-only across all delivery attempts.

use lettre::{
    message::{header::ContentType, Attachment as MimePart, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{MailError, Result},
    message::{Email, MailBody},
    transport::MailTransport,
};

/// SMTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host name.
    pub host: String,
    /// SMTP port (STARTTLS submission port by default).
    pub port: u16,
    /// Account user name.
    pub username: String,
    /// Account password or app password.
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Production mail transport over SMTP with STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Creates an SMTP transport from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Transport` if the relay configuration is
    /// invalid (e.g. unparseable host name).
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::transport(format!("invalid SMTP relay: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self { transport })
    }

    /// Builds the wire message from the domain email.
    fn build_message(email: &Email) -> Result<Message> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| MailError::invalid_message(format!("from address: {e}")))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::invalid_message(format!("to address: {e}")))?;

        let mut builder = Message::builder().from(from).to(to).subject(email.subject.clone());

        if let Some(reply_to) = &email.reply_to {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|e| MailError::invalid_message(format!("reply-to address: {e}")))?;
            builder = builder.reply_to(mailbox);
        }

        let body_part = match &email.body {
            MailBody::Text(text) => SinglePart::plain(text.clone()),
            MailBody::Html(html) => SinglePart::html(html.clone()),
        };

        let message = if email.attachments.is_empty() {
            builder.singlepart(body_part)
        } else {
            let mut multipart = MultiPart::mixed().singlepart(body_part);

            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    MailError::invalid_message(format!(
                        "attachment {} content type: {e}",
                        attachment.filename
                    ))
                })?;

                multipart = multipart.singlepart(
                    MimePart::new(attachment.filename.clone())
                        .body(attachment.content.to_vec(), content_type),
                );
            }

            builder.multipart(multipart)
        };

        message.map_err(|e| MailError::invalid_message(format!("message assembly: {e}")))
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn attempt_delivery(&self, email: &Email) -> Result<()> {
        let message = Self::build_message(email)?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| MailError::transport(e.to_string()))
    }
}
