//! Refer-a-friend signup handler.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use leadbox_core::{EmailFailure, Lead, LeadKind};
use serde::Deserialize;
use tracing::{error, instrument, warn};

use super::{is_valid_email, message_response, normalize_source, validation_response};
use crate::{notify, AppState};

/// Refer-a-friend signup payload.
#[derive(Debug, Deserialize)]
pub struct ReferralRequest {
    /// Name of the existing patient making the referral.
    #[serde(default, alias = "referrerName")]
    pub referrer_name: String,
    /// Referred person's full name.
    #[serde(default, alias = "fullname")]
    pub full_name: String,
    /// Referred person's email address.
    #[serde(default)]
    pub email: String,
    /// Referred person's phone number.
    #[serde(default)]
    pub phone: String,
    /// Whether the referred person declined marketing emails.
    #[serde(default, alias = "optOutEmails")]
    pub opt_out_emails: bool,
    /// Page the referral came from.
    #[serde(default)]
    pub source: Option<String>,
}

impl ReferralRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.referrer_name.trim().is_empty() {
            errors.push("Referrer name is required".to_string());
        }
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

/// Handles `POST /refer-a-friend`.
///
/// Unlike promotions, duplicates are rejected with a field-specific 400
/// so the same person cannot be referred twice. The response is sent as
/// soon as the lead is stored; the receipt and staff alert are
/// dispatched from a background task because the retry loop can hold a
/// failing delivery for minutes.
#[instrument(name = "submit_referral", skip(state, request))]
pub async fn submit_referral(
    State(state): State<AppState>,
    Json(request): Json<ReferralRequest>,
) -> Response {
    let errors = request.validate();
    if !errors.is_empty() {
        return validation_response(errors);
    }

    let leads = &state.storage.leads;
    match leads.email_exists(LeadKind::ReferAFriend, &request.email).await {
        Ok(true) => {
            return message_response(StatusCode::BAD_REQUEST, "Email is already in use.");
        },
        Ok(false) => {},
        Err(e) => {
            error!(error = %e, "duplicate check failed");
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing referral data.",
            );
        },
    }
    match leads.phone_exists(LeadKind::ReferAFriend, &request.phone).await {
        Ok(true) => {
            return message_response(StatusCode::BAD_REQUEST, "Phone number is already in use.");
        },
        Ok(false) => {},
        Err(e) => {
            error!(error = %e, "duplicate check failed");
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing referral data.",
            );
        },
    }

    let source = normalize_source(request.source.as_deref());
    let lead = Lead::referral(
        &request.referrer_name,
        &request.full_name,
        &request.email,
        &request.phone,
        request.opt_out_emails,
        source.clone(),
    );
    if let Err(e) = leads.insert(&lead).await {
        error!(error = %e, "failed to store referral lead");
        return message_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error processing referral data.",
        );
    }

    let task_state = state.clone();
    tokio::spawn(async move {
        send_referral_emails(&task_state, &request, source.as_deref()).await;
    });

    message_response(StatusCode::OK, "Referral saved successfully.")
}

/// Sends the receipt and staff alert, recording exhausted deliveries.
async fn send_referral_emails(state: &AppState, request: &ReferralRequest, source: Option<&str>) {
    let receipt =
        notify::signup_receipt(&state.config, &request.email, &request.full_name, &request.phone);
    let alert = notify::signup_alert(
        &state.config,
        Some(&request.referrer_name),
        &request.full_name,
        &request.email,
        &request.phone,
        request.opt_out_emails,
        source,
    );

    for email in [&receipt, &alert] {
        if let Err(e) = state.mailer.send(email).await {
            warn!(to = %email.to, error = %e, "referral email delivery failed");

            let failure = EmailFailure::new(
                &email.to,
                &email.subject,
                e.to_string(),
                serde_json::json!({
                    "route": "refer-a-friend",
                    "referrer_name": request.referrer_name,
                    "full_name": request.full_name,
                    "email": request.email,
                    "phone": request.phone,
                }),
            );
            if let Err(db_err) = state.storage.email_failures.record(&failure).await {
                error!(error = %db_err, "failed to record email failure");
            }
        }
    }
}
