//! Mail transport capability.
//!
//! A transport attempts exactly one delivery per call; retry scheduling is
//! the sender's job. The trait boundary keeps the sender testable against
//! scripted fakes and decouples it from the SMTP client.

use crate::{error::Result, message::Email};

/// A capability that can attempt one email delivery.
///
/// The transport is shared read-only across attempts; the sender does not
/// own or recreate it. Production code injects [`crate::SmtpMailer`], tests
/// inject fakes.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync + std::fmt::Debug {
    /// Attempts one delivery of the message.
    ///
    /// # Errors
    ///
    /// Returns `MailError::Transport` for transient delivery failures and
    /// `MailError::InvalidMessage` when the message cannot be constructed
    /// for the wire.
    async fn attempt_delivery(&self, email: &Email) -> Result<()>;
}
