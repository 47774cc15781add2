//! HTTP surface for the Leadbox lead-capture service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use leadbox_core::{storage::Storage, Clock};
use leadbox_mailer::Mailer;

pub mod config;
pub mod handlers;
pub mod notify;
pub mod server;

pub use config::Config;
pub use server::{create_router, start_server};

/// Shared application state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database repositories.
    pub storage: Arc<Storage>,
    /// Reliable email sender.
    pub mailer: Mailer,
    /// Clock for timestamps and health probes.
    pub clock: Arc<dyn Clock>,
    /// Service configuration.
    pub config: Arc<Config>,
    /// HTTP client for partner lead forwarding.
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(
        storage: Arc<Storage>,
        mailer: Mailer,
        clock: Arc<dyn Clock>,
        config: Arc<Config>,
    ) -> Self {
        Self { storage, mailer, clock, config, http: reqwest::Client::new() }
    }
}
