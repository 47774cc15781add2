//! Promotion signup handler.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadbox_core::{EmailFailure, Lead, LeadKind};
use serde::Deserialize;
use tracing::{error, instrument, warn};

use super::{is_valid_email, message_response, normalize_source, validation_response};
use crate::{notify, AppState};

/// Promotion signup payload.
#[derive(Debug, Deserialize)]
pub struct PromotionRequest {
    /// Submitter full name.
    #[serde(default, alias = "fullname")]
    pub full_name: String,
    /// Submitter email address.
    #[serde(default)]
    pub email: String,
    /// Submitter phone number.
    #[serde(default)]
    pub phone: String,
    /// Whether the submitter declined marketing emails.
    #[serde(default, alias = "optOutEmails")]
    pub opt_out_emails: bool,
    /// Page the signup came from, possibly percent-encoded.
    #[serde(default)]
    pub source: Option<String>,
}

impl PromotionRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.full_name.trim().is_empty() {
            errors.push("Full name is required".to_string());
        }
        if !is_valid_email(&self.email) {
            errors.push("Invalid email address".to_string());
        }
        if self.phone.trim().is_empty() {
            errors.push("Phone number is required".to_string());
        }
        errors
    }
}

/// Handles `POST /promotion`.
///
/// Deduplicates by email and phone across opt-in and opt-out signups,
/// stores new leads, then sends a confirmation receipt to the submitter
/// and an alert to the staff inbox. The emails go out even for
/// duplicates so repeat submitters still get a confirmation. Delivery
/// exhaustion is recorded but does not fail the request; the signup is
/// already stored at that point.
#[instrument(name = "submit_promotion", skip(state, request))]
pub async fn submit_promotion(
    State(state): State<AppState>,
    Json(request): Json<PromotionRequest>,
) -> Response {
    let errors = request.validate();
    if !errors.is_empty() {
        return validation_response(errors);
    }

    let source = normalize_source(request.source.as_deref());

    let already_exists = match lead_exists(&state, &request.email, &request.phone).await {
        Ok(exists) => exists,
        Err(e) => {
            error!(error = %e, "duplicate check failed");
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing promotion data.",
            );
        },
    };

    if !already_exists {
        let lead = Lead::promotion(
            &request.full_name,
            &request.email,
            &request.phone,
            request.opt_out_emails,
            source.clone(),
        );
        if let Err(e) = state.storage.leads.insert(&lead).await {
            error!(error = %e, "failed to store promotion lead");
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing promotion data.",
            );
        }
    }

    send_signup_emails(&state, &request, source.as_deref()).await;

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Promotion processed successfully.",
            "already_exists": already_exists,
        })),
    )
        .into_response()
}

async fn lead_exists(state: &AppState, email: &str, phone: &str) -> leadbox_core::Result<bool> {
    let leads = &state.storage.leads;
    Ok(leads.email_exists(LeadKind::Promotion, email).await?
        || leads.phone_exists(LeadKind::Promotion, phone).await?)
}

/// Sends the receipt and staff alert, recording exhausted deliveries.
async fn send_signup_emails(state: &AppState, request: &PromotionRequest, source: Option<&str>) {
    let receipt =
        notify::signup_receipt(&state.config, &request.email, &request.full_name, &request.phone);
    let alert = notify::signup_alert(
        &state.config,
        None,
        &request.full_name,
        &request.email,
        &request.phone,
        request.opt_out_emails,
        source,
    );

    for email in [&receipt, &alert] {
        if let Err(e) = state.mailer.send(email).await {
            warn!(to = %email.to, error = %e, "signup email delivery failed");

            let failure = EmailFailure::new(
                &email.to,
                &email.subject,
                e.to_string(),
                serde_json::json!({
                    "route": "promotion",
                    "full_name": request.full_name,
                    "email": request.email,
                    "phone": request.phone,
                    "opt_out_emails": request.opt_out_emails,
                }),
            );
            if let Err(db_err) = state.storage.email_failures.record(&failure).await {
                error!(error = %db_err, "failed to record email failure");
            }
        }
    }
}
