//! Error types for email delivery operations.
//!
//! The taxonomy is deliberately small: transport failures are transient and
//! retried, message construction failures are permanent, and exhaustion of
//! the retry budget is the single terminal failure callers must handle.

use thiserror::Error;

/// Result type alias for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Error types for email delivery.
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// A single delivery attempt failed at the transport level.
    ///
    /// Always treated as transient; the sender retries until the attempt
    /// budget is exhausted.
    #[error("transport failure: {message}")]
    Transport {
        /// Error message from the underlying mail transport.
        message: String,
    },

    /// The message could not be constructed for the transport.
    ///
    /// Malformed addresses or invalid attachment content types. Retrying
    /// cannot help, so this propagates immediately.
    #[error("invalid message: {message}")]
    InvalidMessage {
        /// Description of what made the message invalid.
        message: String,
    },

    /// All delivery attempts exhausted.
    #[error("delivery failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The last transport error observed.
        last_error: String,
    },
}

impl MailError {
    /// Creates a transport error from a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Creates an invalid-message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage { message: message.into() }
    }

    /// Creates a retries-exhausted error wrapping the last attempt failure.
    pub fn retries_exhausted(attempts: u32, last: &MailError) -> Self {
        Self::RetriesExhausted { attempts, last_error: last.to_string() }
    }

    /// Whether the sender should retry after this error.
    ///
    /// Every transport-level failure is retryable; construction failures
    /// and exhaustion are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
