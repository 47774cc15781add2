//! Integration tests for the reliable delivery sender.
//!
//! Exercises the full retry loop against scripted fake transports with a
//! virtual clock, covering attempt accounting, backoff bounds, attachment
//! integrity across retries, and independence of concurrent sends.

use std::{sync::Arc, time::Duration};

use leadbox_mailer::{MailError, Mailer, RetryPolicy};
use leadbox_testing::{
    sample_enquiry_email, sample_receipt_email, sample_referral_email, FakeTransport, TestClock,
};
use proptest::prelude::*;

fn mailer_with(transport: &FakeTransport, clock: &TestClock) -> Mailer {
    Mailer::with_clock(
        Arc::new(transport.clone()),
        RetryPolicy::default(),
        Arc::new(clock.clone()),
    )
}

#[tokio::test]
async fn first_attempt_success_skips_backoff() {
    let transport = FakeTransport::new();
    let clock = TestClock::new();
    let mailer = mailer_with(&transport, &clock);

    mailer.send(&sample_receipt_email()).await.unwrap();

    assert_eq!(transport.attempts(), 1);
    assert_eq!(clock.elapsed(), Duration::ZERO, "no backoff wait on immediate success");
}

#[tokio::test]
async fn always_failing_transport_is_invoked_exactly_six_times() {
    let transport = FakeTransport::failing();
    let clock = TestClock::new();
    let mailer = mailer_with(&transport, &clock);

    let err = mailer.send(&sample_receipt_email()).await.unwrap_err();

    match err {
        MailError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 6),
        other => panic!("expected RetriesExhausted, got {other}"),
    }
    assert_eq!(transport.attempts(), 6, "budget is 1 initial + 5 retries, never a 7th");
}

#[tokio::test]
async fn transport_recovering_on_fourth_attempt_succeeds() {
    let transport = FakeTransport::fail_times(3);
    let clock = TestClock::new();
    let mailer = mailer_with(&transport, &clock);

    mailer.send(&sample_receipt_email()).await.unwrap();

    assert_eq!(transport.attempts(), 4);
}

#[tokio::test]
async fn total_backoff_stays_within_policy_bounds() {
    let transport = FakeTransport::failing();
    let clock = TestClock::new();
    let mailer = mailer_with(&transport, &clock);

    let _ = mailer.send(&sample_receipt_email()).await;

    // Five waits, each drawn from [5s, 20s] inclusive
    let elapsed = clock.elapsed();
    assert!(elapsed >= Duration::from_secs(25), "elapsed {elapsed:?} below 5 * 5s");
    assert!(elapsed <= Duration::from_secs(100), "elapsed {elapsed:?} above 5 * 20s");
}

#[tokio::test]
async fn attachment_bytes_identical_on_every_attempt() {
    let email = sample_referral_email();
    let content = email.attachments[0].content.clone();
    let filename = email.attachments[0].filename.clone();

    let transport = FakeTransport::fail_times(3);
    let clock = TestClock::new();
    let mailer = mailer_with(&transport, &clock);

    mailer.send(&email).await.unwrap();

    let deliveries = transport.deliveries();
    assert_eq!(deliveries.len(), 4);
    for delivery in deliveries {
        assert_eq!(delivery.attachments.len(), 1);
        assert_eq!(delivery.attachments[0].content, content);
        assert_eq!(delivery.attachments[0].filename, filename);
    }
}

#[tokio::test]
async fn concurrent_sends_do_not_interfere() {
    let failing = FakeTransport::failing();
    let succeeding = FakeTransport::new();
    let clock = TestClock::new();

    let failing_mailer = mailer_with(&failing, &clock);
    let succeeding_mailer = mailer_with(&succeeding, &clock);

    let alert = sample_enquiry_email();
    let receipt = sample_receipt_email();

    let (failed, delivered) =
        tokio::join!(failing_mailer.send(&receipt), succeeding_mailer.send(&alert));

    assert!(matches!(failed, Err(MailError::RetriesExhausted { attempts: 6, .. })));
    delivered.unwrap();

    assert_eq!(failing.attempts(), 6);
    assert_eq!(succeeding.attempts(), 1);
    assert_eq!(succeeding.last_delivery().unwrap().subject, alert.subject);
}

#[tokio::test]
async fn configured_retry_ceiling_is_respected() {
    let transport = FakeTransport::failing();
    let policy = RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(20));
    let mailer = Mailer::with_clock(
        Arc::new(transport.clone()),
        policy,
        Arc::new(TestClock::new()),
    );

    let err = mailer.send(&sample_receipt_email()).await.unwrap_err();

    assert!(matches!(err, MailError::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(transport.attempts(), 3);
}

proptest! {
    /// Backoff samples stay inside the closed range for arbitrary policies.
    #[test]
    fn sampled_backoff_within_bounds(min_ms in 1u64..30_000, span_ms in 0u64..30_000) {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(min_ms),
            Duration::from_millis(min_ms + span_ms),
        );

        for _ in 0..32 {
            let delay = policy.sample_backoff();
            prop_assert!(delay >= policy.backoff_min);
            prop_assert!(delay <= policy.backoff_max);
        }
    }
}
