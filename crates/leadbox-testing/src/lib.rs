//! Test infrastructure and utilities for Leadbox.
//!
//! Provides a scriptable fake mail transport, fixture builders for emails
//! and form submissions, and re-exports of the deterministic clock so test
//! crates have one import surface.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod transport;

pub use fixtures::{sample_enquiry_email, sample_receipt_email, sample_referral_email};
pub use leadbox_core::{Clock, TestClock};
pub use transport::{FakeTransport, TransportScript};
