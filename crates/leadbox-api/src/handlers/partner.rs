//! Partner lead-forwarding handler.
//!
//! Maps a website lead into the partner CRM's capture format and posts
//! it to the configured hook URL.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, instrument, warn};

use super::{is_valid_email, message_response, validation_response};
use crate::AppState;

/// Maps source page slugs to the partner's treatment codes.
const TREATMENT_SLUG_MAP: &[(&str, &str)] = &[
    ("cosmetic-dentistry/dental-implants", "implants"),
    ("cosmetic-dentistry/invisalign", "invisalign"),
    ("Homepage", "general-dentistry"),
    ("practice", "patient-plan-assessment"),
    ("general-dentistry/emergency-dentistry", "emergency-appointments"),
    ("general-dentistry/dental-therapist", "preventative-dentistry"),
    ("general-dentistry/dental-hygiene", "hygienist-services"),
    ("general-dentistry/sports-mouthguards", "sports-mouthguards"),
];

/// Partner forwarding payload, same shape as a promotion signup.
#[derive(Debug, Deserialize)]
pub struct PartnerLeadRequest {
    /// Lead full name, split into first/last for the partner.
    #[serde(default, alias = "fullname")]
    pub full_name: String,
    /// Lead email address.
    #[serde(default)]
    pub email: String,
    /// Lead phone number.
    #[serde(default)]
    pub phone: String,
    /// Whether the lead declined marketing emails.
    #[serde(default, alias = "optOutEmails")]
    pub opt_out_emails: bool,
    /// Source page slug, looked up in the treatment map.
    #[serde(default)]
    pub source: Option<String>,
}

/// Body posted to the partner capture hook.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartnerCaptureBody {
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    consent_given: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    treatment: Option<String>,
}

/// Handles `POST /partner`.
///
/// Returns 502 when the partner hook rejects the lead or cannot be
/// reached, and 503 when no capture URL is configured.
#[instrument(name = "forward_partner_lead", skip(state, request))]
pub async fn forward_partner_lead(
    State(state): State<AppState>,
    Json(request): Json<PartnerLeadRequest>,
) -> Response {
    let mut errors = Vec::new();
    if request.full_name.trim().is_empty() {
        errors.push("Full name is required".to_string());
    }
    if !is_valid_email(&request.email) {
        errors.push("Invalid email address".to_string());
    }
    if !errors.is_empty() {
        return validation_response(errors);
    }

    let Some(capture_url) = state.config.partner_capture_url.as_deref() else {
        warn!("partner forwarding requested but no capture URL configured");
        return message_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Partner forwarding is not configured.",
        );
    };

    let (first_name, last_name) = split_full_name(&request.full_name);
    let treatment = request.source.as_deref().and_then(treatment_for_source);
    if treatment.is_none() {
        warn!(source = ?request.source, "no treatment mapping for source page");
    }

    let body = PartnerCaptureBody {
        first_name,
        last_name,
        email: request.email.clone(),
        phone: request.phone.clone(),
        consent_given: !request.opt_out_emails,
        treatment: treatment.map(str::to_string),
    };

    match state.http.post(capture_url).json(&body).send().await {
        Ok(response) if response.status().is_success() => {
            message_response(StatusCode::OK, "Lead forwarded to partner.")
        },
        Ok(response) => {
            error!(status = %response.status(), "partner hook rejected lead");
            message_response(StatusCode::BAD_GATEWAY, "Failed to forward lead to partner.")
        },
        Err(e) => {
            error!(error = %e, "partner hook unreachable");
            message_response(StatusCode::BAD_GATEWAY, "Failed to forward lead to partner.")
        },
    }
}

/// Splits a full name into first name and the remainder.
fn split_full_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

fn treatment_for_source(source: &str) -> Option<&'static str> {
    TREATMENT_SLUG_MAP
        .iter()
        .find(|(slug, _)| *slug == source)
        .map(|(_, treatment)| *treatment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_splits_on_first_space() {
        assert_eq!(
            split_full_name("Jo Middle Bloggs"),
            ("Jo".to_string(), "Middle Bloggs".to_string())
        );
        assert_eq!(split_full_name("Cher"), ("Cher".to_string(), String::new()));
        assert_eq!(split_full_name("  Jo   Bloggs  "), ("Jo".to_string(), "Bloggs".to_string()));
    }

    #[test]
    fn known_sources_map_to_treatments() {
        assert_eq!(treatment_for_source("cosmetic-dentistry/invisalign"), Some("invisalign"));
        assert_eq!(treatment_for_source("practice"), Some("patient-plan-assessment"));
        assert_eq!(treatment_for_source("unknown-page"), None);
    }

    #[test]
    fn capture_body_serializes_camel_case() {
        let body = PartnerCaptureBody {
            first_name: "Jo".to_string(),
            last_name: "Bloggs".to_string(),
            email: "jo@example.com".to_string(),
            phone: "07700900000".to_string(),
            consent_given: true,
            treatment: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["firstName"], "Jo");
        assert_eq!(json["consentGiven"], true);
        assert!(json.get("treatment").is_none());
    }
}
