//! General enquiry form handler.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use leadbox_core::EmailFailure;
use leadbox_mailer::Email;
use serde::Deserialize;
use tracing::{error, instrument, warn};

use super::{is_valid_email, message_response, validation_response};
use crate::AppState;

/// Enquiry form submission payload.
#[derive(Debug, Deserialize)]
pub struct EnquiryRequest {
    /// Submitter name.
    #[serde(default)]
    pub name: String,
    /// Website section the enquiry came from, e.g. `dental` or `freight`.
    #[serde(default)]
    pub category: String,
    /// Submitter email address, used as reply-to on the alert.
    #[serde(default)]
    pub email: String,
    /// Optional contact number.
    #[serde(default)]
    pub phone: String,
    /// Free-form enquiry text.
    #[serde(default)]
    pub message: String,
}

impl EnquiryRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if !is_valid_email(&self.email) {
            errors.push("Invalid email address".to_string());
        }
        if self.message.trim().is_empty() {
            errors.push("Message is required".to_string());
        }
        errors
    }
}

/// Handles `POST /enquiry`.
///
/// Forwards the enquiry to the staff inbox with the submitter as
/// reply-to. Delivery failures fail the request after a record is kept,
/// so the website can tell the visitor their message did not arrive.
#[instrument(name = "submit_enquiry", skip(state, request), fields(category = %request.category))]
pub async fn submit_enquiry(
    State(state): State<AppState>,
    Json(request): Json<EnquiryRequest>,
) -> Response {
    let errors = request.validate();
    if !errors.is_empty() {
        return validation_response(errors);
    }

    let category = request.category.trim();
    let subject = if category.is_empty() {
        "Enquiry Form Submission".to_string()
    } else {
        format!("{} Enquiry Form Submission", category.to_uppercase())
    };

    let body = format!(
        "Name: {}\nEmail: {}\nPhone: {}\n\nMessage:\n{}",
        request.name, request.email, request.phone, request.message,
    );

    let email = Email::text(&state.config.email_from, &state.config.notify_address, &subject, body)
        .with_reply_to(&request.email);

    if let Err(e) = state.mailer.send(&email).await {
        warn!(error = %e, "enquiry email delivery failed");

        let failure = EmailFailure::new(
            &email.to,
            &email.subject,
            e.to_string(),
            serde_json::json!({
                "route": "enquiry",
                "name": request.name,
                "email": request.email,
                "category": request.category,
            }),
        );
        if let Err(db_err) = state.storage.email_failures.record(&failure).await {
            error!(error = %db_err, "failed to record email failure");
        }

        return message_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send enquiry email",
        );
    }

    message_response(StatusCode::OK, "Email sent successfully")
}
