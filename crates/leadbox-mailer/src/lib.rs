//! Reliable notification email delivery.
//!
//! A small delivery primitive shared by every form handler: compose an
//! [`Email`], hand it to the [`Mailer`], and the mailer drives a bounded
//! retry loop with randomized backoff against an injected
//! [`MailTransport`] capability. Transient transport failures are absorbed
//! internally; only exhaustion of the attempt budget surfaces to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod retry;
pub mod sender;
pub mod smtp;
pub mod transport;

pub use error::{MailError, Result};
pub use message::{Attachment, Email, MailBody};
pub use retry::RetryPolicy;
pub use sender::Mailer;
pub use smtp::{SmtpConfig, SmtpMailer};
pub use transport::MailTransport;
