//! The reliable delivery sender.
//!
//! Drives a bounded retry loop over an injected transport: attempt, and on
//! transient failure wait a randomized backoff interval and try again, up to
//! the policy's attempt ceiling. The loop is explicit rather than recursive
//! so the ceiling stays visible and the stack stays flat.

use std::sync::Arc;

use leadbox_core::{Clock, RealClock};
use tracing::{debug, warn};

use crate::{
    error::{MailError, Result},
    message::Email,
    retry::RetryPolicy,
    transport::MailTransport,
};

/// Reliable email sender with bounded randomized-backoff retries.
///
/// Cheap to clone; concurrent `send` calls for different messages share no
/// mutable state and never interfere with each other's attempt counts.
#[derive(Debug, Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl Mailer {
    /// Creates a mailer over the given transport and policy.
    pub fn new(transport: Arc<dyn MailTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy, clock: Arc::new(RealClock) }
    }

    /// Creates a mailer with an injected clock.
    ///
    /// Tests use this with a virtual clock so backoff waits advance
    /// instantly.
    pub fn with_clock(
        transport: Arc<dyn MailTransport>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { transport, policy, clock }
    }

    /// Returns the retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Delivers an email, retrying transient failures.
    ///
    /// Each attempt invokes the transport exactly once. On transient
    /// failure the sender suspends for a backoff interval sampled uniformly
    /// from the policy range, then retries. Attempts for one message are
    /// strictly sequential.
    ///
    /// # Errors
    ///
    /// Returns `MailError::RetriesExhausted` once the attempt budget is
    /// consumed, carrying the last transport error. Non-retryable errors
    /// (message construction failures) propagate immediately without
    /// consuming the retry budget.
    pub async fn send(&self, email: &Email) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            match self.transport.attempt_delivery(email).await {
                Ok(()) => {
                    debug!(to = %email.to, subject = %email.subject, attempt, "email delivered");
                    return Ok(());
                },
                Err(e) if !e.is_retryable() => {
                    warn!(to = %email.to, error = %e, "email rejected without retry");
                    return Err(e);
                },
                Err(e) => {
                    if attempt >= self.policy.max_retries {
                        let attempts = attempt + 1;
                        warn!(
                            to = %email.to,
                            subject = %email.subject,
                            attempts,
                            error = %e,
                            "email delivery exhausted retry budget"
                        );
                        return Err(MailError::retries_exhausted(attempts, &e));
                    }

                    let delay = self.policy.sample_backoff();
                    warn!(
                        to = %email.to,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "email delivery failed, backing off before retry"
                    );

                    self.clock.sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Mutex,
    };

    use leadbox_core::TestClock;

    use super::*;

    /// Minimal scripted transport for unit tests. The full-featured fake
    /// lives in leadbox-testing; this one avoids the dev-dependency inside
    /// the crate itself.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        failures_before_success: u32,
        calls: AtomicU32,
        outcomes: Mutex<Vec<Result<()>>>,
    }

    impl ScriptedTransport {
        fn failing_times(n: u32) -> Self {
            Self { failures_before_success: n, ..Default::default() }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MailTransport for ScriptedTransport {
        async fn attempt_delivery(&self, _email: &Email) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(outcome) = self.outcomes.lock().unwrap().pop() {
                return outcome;
            }

            if call < self.failures_before_success {
                Err(MailError::transport("simulated failure"))
            } else {
                Ok(())
            }
        }
    }

    fn test_mailer(transport: Arc<ScriptedTransport>) -> Mailer {
        Mailer::with_clock(transport, RetryPolicy::default(), Arc::new(TestClock::new()))
    }

    fn sample_email() -> Email {
        Email::text("noreply@example.com", "patient@example.com", "Hello", "body")
    }

    #[tokio::test]
    async fn immediate_success_makes_one_attempt() {
        let transport = Arc::new(ScriptedTransport::default());
        let mailer = test_mailer(transport.clone());

        mailer.send(&sample_email()).await.unwrap();

        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let transport = Arc::new(ScriptedTransport::failing_times(2));
        let mailer = test_mailer(transport.clone());

        mailer.send(&sample_email()).await.unwrap();

        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn invalid_message_fails_fast() {
        let transport = Arc::new(ScriptedTransport::default());
        transport
            .outcomes
            .lock()
            .unwrap()
            .push(Err(MailError::invalid_message("unparseable address")));
        let mailer = test_mailer(transport.clone());

        let err = mailer.send(&sample_email()).await.unwrap_err();

        assert!(matches!(err, MailError::InvalidMessage { .. }));
        assert_eq!(transport.calls(), 1, "non-retryable errors must not be retried");
    }

    #[tokio::test]
    async fn exhaustion_reports_total_attempts() {
        let transport = Arc::new(ScriptedTransport::failing_times(u32::MAX));
        let mailer = test_mailer(transport.clone());

        let err = mailer.send(&sample_email()).await.unwrap_err();

        match err {
            MailError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 6),
            other => panic!("expected exhaustion, got {other}"),
        }
        assert_eq!(transport.calls(), 6);
    }
}
