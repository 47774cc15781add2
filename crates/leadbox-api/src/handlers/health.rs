//! Health endpoints for uptime monitors and orchestration probes.
//!
//! `/health` and `/ready` probe the database; `/live` only confirms the
//! process is responding. A lead-capture service has exactly one hard
//! dependency, so the report carries a single database section rather
//! than a component registry.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::AppState;

/// Report returned by `/health` and `/ready`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    /// When the probe ran.
    pub timestamp: DateTime<Utc>,
    /// Database probe outcome.
    pub database: DatabaseReport,
    /// Service version.
    pub version: &'static str,
}

/// Database probe outcome inside a [`HealthReport`].
#[derive(Debug, Serialize)]
pub struct DatabaseReport {
    /// `up` or `down`.
    pub status: &'static str,
    /// Probe round-trip in milliseconds.
    pub response_time_ms: u64,
    /// Failure detail, present only when down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    fn new(timestamp: DateTime<Utc>, database: DatabaseReport) -> Self {
        let status = if database.error.is_none() { "healthy" } else { "unhealthy" };
        Self { status, timestamp, database, version: env!("CARGO_PKG_VERSION") }
    }

    fn status_code(&self) -> StatusCode {
        if self.status == "healthy" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Handles `GET /health`.
///
/// Called frequently by load balancers; the probe is a single trivial
/// query.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let started = state.clock.now();
    let outcome = state.storage.health_check().await;
    let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let database = match outcome {
        Ok(()) => DatabaseReport { status: "up", response_time_ms, error: None },
        Err(e) => {
            error!(error = %e, "database health probe failed");
            DatabaseReport { status: "down", response_time_ms, error: Some(e.to_string()) }
        },
    };

    let report = HealthReport::new(DateTime::<Utc>::from(state.clock.now_system()), database);
    debug!(status = report.status, database = report.database.status, "health check completed");

    (report.status_code(), Json(report)).into_response()
}

/// Handles `GET /ready`.
///
/// Readiness currently equals health: the service can take traffic once
/// the database answers.
#[instrument(name = "readiness_check", skip(state))]
pub async fn readiness_check(State(state): State<AppState>) -> Response {
    health_check(State(state)).await
}

/// Handles `GET /live`.
///
/// Process-only check with no external dependencies.
#[instrument(name = "liveness_check", skip(state))]
pub async fn liveness_check(State(state): State<AppState>) -> Response {
    let response = serde_json::json!({
        "status": "alive",
        "timestamp": DateTime::<Utc>::from(state.clock.now_system()),
        "service": "leadbox-api",
    });

    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_with_reachable_database_is_healthy() {
        let report = HealthReport::new(
            Utc::now(),
            DatabaseReport { status: "up", response_time_ms: 3, error: None },
        );

        assert_eq!(report.status, "healthy");
        assert_eq!(report.status_code(), StatusCode::OK);
    }

    #[test]
    fn report_with_failed_probe_is_unhealthy() {
        let report = HealthReport::new(
            Utc::now(),
            DatabaseReport {
                status: "down",
                response_time_ms: 12,
                error: Some("connection refused".to_string()),
            },
        );

        assert_eq!(report.status, "unhealthy");
        assert_eq!(report.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn error_field_is_omitted_when_up() {
        let report = HealthReport::new(
            Utc::now(),
            DatabaseReport { status: "up", response_time_ms: 1, error: None },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["database"].get("error").is_none());
        assert_eq!(json["database"]["status"], "up");
    }
}
