//! Leadbox core domain models, errors and persistence.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{EmailFailure, FailureId, Lead, LeadId, LeadKind};
pub use time::{Clock, RealClock, TestClock};
