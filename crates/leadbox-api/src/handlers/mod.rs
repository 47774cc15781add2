//! Request handlers for the Leadbox API.
//!
//! Each form route is a thin caller of the reliable sender with its own
//! exhaustion policy: enquiries fail the request, signups record the
//! failure and still confirm to the submitter, referrals dispatch in the
//! background.

pub mod enquiry;
pub mod health;
pub mod partner;
pub mod promotion;
pub mod referral;
pub mod uploads;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub use enquiry::submit_enquiry;
pub use health::{health_check, liveness_check, readiness_check};
pub use partner::forward_partner_lead;
pub use promotion::submit_promotion;
pub use referral::submit_referral;
pub use uploads::{submit_careers_application, submit_referral_upload};

/// Builds a `{"message": ...}` JSON response with the given status.
pub(crate) fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}

/// Builds a 400 response listing validation errors.
pub(crate) fn validation_response(errors: Vec<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "errors": errors }))).into_response()
}

/// Minimal email shape check; full verification happens at the SMTP relay.
pub(crate) fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Normalizes a source page reference: percent-decodes and strips leading
/// slashes, so `%2Fcosmetic-dentistry%2Finvisalign` and
/// `/cosmetic-dentistry/invisalign` store identically.
pub(crate) fn normalize_source(source: Option<&str>) -> Option<String> {
    let source = source?.trim();
    if source.is_empty() {
        return None;
    }

    let decoded = percent_encoding::percent_decode_str(source).decode_utf8_lossy();
    Some(decoded.trim_start_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("jo@example.com"));
        assert!(is_valid_email("jo.bloggs+promo@mail.example.co.uk"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("jo"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("jo@nodot"));
        assert!(!is_valid_email("jo@.com"));
    }

    #[test]
    fn source_is_decoded_and_trimmed() {
        assert_eq!(
            normalize_source(Some("%2Fcosmetic-dentistry%2Finvisalign")).as_deref(),
            Some("cosmetic-dentistry/invisalign")
        );
        assert_eq!(normalize_source(Some("/practice")).as_deref(), Some("practice"));
        assert_eq!(normalize_source(Some("")), None);
        assert_eq!(normalize_source(None), None);
    }
}
