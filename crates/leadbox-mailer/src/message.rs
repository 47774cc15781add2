//! Email message model.
//!
//! An [`Email`] is immutable once constructed and owned by the call that
//! built it until handed to the sender. Attachment content is held in
//! [`Bytes`] so the identical payload is resubmitted on every retry without
//! copying.

use bytes::Bytes;

/// Body of an email, plain text or HTML markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailBody {
    /// Plain text body.
    Text(String),
    /// HTML body.
    Html(String),
}

/// A binary attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// MIME content type, e.g. `application/pdf`.
    pub content_type: String,
    /// File content.
    pub content: Bytes,
}

impl Attachment {
    /// Creates a new attachment.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }
}

/// A fully composed email message.
///
/// The sender has no knowledge of message semantics; a confirmation receipt
/// and an internal staff alert travel through the same type.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Optional reply-to address (used when the form submitter should
    /// receive replies to a staff-originated alert).
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: MailBody,
    /// Binary attachments, possibly empty.
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Creates a plain-text email.
    pub fn text(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            reply_to: None,
            subject: subject.into(),
            body: MailBody::Text(body.into()),
            attachments: Vec::new(),
        }
    }

    /// Creates an HTML email.
    pub fn html(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            reply_to: None,
            subject: subject.into(),
            body: MailBody::Html(body.into()),
            attachments: Vec::new(),
        }
    }

    /// Sets the reply-to address.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Adds multiple attachments.
    #[must_use]
    pub fn with_attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
        self.attachments.extend(attachments);
        self
    }
}
