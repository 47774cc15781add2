//! Scriptable fake mail transport.
//!
//! Records every delivery attempt (including the full message, so tests can
//! assert attachment bytes survive retries) and follows a script deciding
//! which attempts fail.

use std::sync::{Arc, Mutex};

use leadbox_mailer::{Email, MailError, MailTransport};

/// Outcome script for a fake transport.
#[derive(Debug, Clone)]
pub enum TransportScript {
    /// Every attempt succeeds.
    AlwaysSucceed,
    /// Every attempt fails with a transient transport error.
    AlwaysFail,
    /// The first `n` attempts fail, subsequent attempts succeed.
    FailTimes(u32),
}

#[derive(Debug, Default)]
struct Inner {
    deliveries: Vec<Email>,
    attempts: u32,
}

/// Fake transport that records attempts and scripts outcomes.
///
/// Cheap to clone; clones share the same recorded state, so a test can keep
/// a handle while the mailer owns another.
#[derive(Debug, Clone)]
pub struct FakeTransport {
    script: TransportScript,
    inner: Arc<Mutex<Inner>>,
}

impl FakeTransport {
    /// Creates a transport that always succeeds.
    pub fn new() -> Self {
        Self::with_script(TransportScript::AlwaysSucceed)
    }

    /// Creates a transport that always fails transiently.
    pub fn failing() -> Self {
        Self::with_script(TransportScript::AlwaysFail)
    }

    /// Creates a transport that fails the first `n` attempts.
    pub fn fail_times(n: u32) -> Self {
        Self::with_script(TransportScript::FailTimes(n))
    }

    /// Creates a transport with an explicit script.
    pub fn with_script(script: TransportScript) -> Self {
        Self { script, inner: Arc::new(Mutex::new(Inner::default())) }
    }

    /// Number of delivery attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.inner.lock().unwrap().attempts
    }

    /// Messages passed to the transport, one per attempt, in order.
    pub fn deliveries(&self) -> Vec<Email> {
        self.inner.lock().unwrap().deliveries.clone()
    }

    /// The message delivered on the final attempt, if any attempt was made.
    pub fn last_delivery(&self) -> Option<Email> {
        self.inner.lock().unwrap().deliveries.last().cloned()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MailTransport for FakeTransport {
    async fn attempt_delivery(&self, email: &Email) -> Result<(), MailError> {
        let attempt = {
            let mut inner = self.inner.lock().unwrap();
            inner.deliveries.push(email.clone());
            let attempt = inner.attempts;
            inner.attempts += 1;
            attempt
        };

        match self.script {
            TransportScript::AlwaysSucceed => Ok(()),
            TransportScript::AlwaysFail => {
                Err(MailError::transport(format!("scripted failure on attempt {attempt}")))
            },
            TransportScript::FailTimes(n) if attempt < n => {
                Err(MailError::transport(format!("scripted failure on attempt {attempt}")))
            },
            TransportScript::FailTimes(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::text("from@example.com", "to@example.com", "subject", "body")
    }

    #[tokio::test]
    async fn records_each_attempt() {
        let transport = FakeTransport::new();

        transport.attempt_delivery(&email()).await.unwrap();
        transport.attempt_delivery(&email()).await.unwrap();

        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.deliveries().len(), 2);
    }

    #[tokio::test]
    async fn fail_times_script_recovers() {
        let transport = FakeTransport::fail_times(1);

        assert!(transport.attempt_delivery(&email()).await.is_err());
        assert!(transport.attempt_delivery(&email()).await.is_ok());
    }
}
