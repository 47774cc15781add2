//! Multipart form handlers for referral and careers submissions.
//!
//! Both routes accept arbitrary text fields plus file uploads, flatten
//! the fields into a plain-text staff email, and forward accepted files
//! as attachments.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
};
use chrono::NaiveDate;
use leadbox_core::EmailFailure;
use leadbox_mailer::Attachment;
use tracing::{debug, error, instrument, warn};

use super::message_response;
use crate::{notify, AppState};

/// File extensions accepted as attachments; everything else is dropped.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "pdf"];

/// Handles `POST /referral` (multipart).
#[instrument(name = "submit_referral_upload", skip(state, multipart))]
pub async fn submit_referral_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let form = match collect_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let referral_type = form
        .field("referralType")
        .or_else(|| form.field("referral_type"))
        .unwrap_or("General")
        .to_string();
    let subject = format!("New {referral_type} Referral");

    send_form_email(&state, "referral", subject, form).await
}

/// Handles `POST /careers` (multipart).
#[instrument(name = "submit_careers_application", skip(state, multipart))]
pub async fn submit_careers_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let form = match collect_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    send_form_email(&state, "careers", "New Careers Application".to_string(), form).await
}

/// Collected multipart submission: text fields in order plus accepted
/// attachments.
struct SubmittedForm {
    fields: Vec<(String, String)>,
    attachments: Vec<Attachment>,
}

impl SubmittedForm {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Reads the multipart stream, separating text fields from uploads.
///
/// Files with a disallowed extension are skipped rather than rejected so
/// one stray upload does not lose the whole submission. Date-of-birth
/// fields are reformatted to dd/mm/yyyy for the staff email.
async fn collect_form(mut multipart: Multipart) -> Result<SubmittedForm, Response> {
    let mut fields = Vec::new();
    let mut attachments = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "invalid multipart payload");
                return Err(message_response(StatusCode::BAD_REQUEST, "Invalid form payload."));
            },
        };

        let name = field.name().unwrap_or_default().to_string();

        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let Some(content_type) = accepted_content_type(&filename, field.content_type()) else {
                debug!(filename, "dropping attachment with disallowed extension");
                continue;
            };

            match field.bytes().await {
                Ok(bytes) => attachments.push(Attachment::new(filename, content_type, bytes)),
                Err(e) => {
                    warn!(filename, error = %e, "failed to read attachment");
                    return Err(message_response(
                        StatusCode::BAD_REQUEST,
                        "Invalid form payload.",
                    ));
                },
            }
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(e) => {
                warn!(field = name, error = %e, "failed to read form field");
                return Err(message_response(StatusCode::BAD_REQUEST, "Invalid form payload."));
            },
        };

        let value = if name == "dateOfBirth" || name == "date_of_birth" {
            format_date_of_birth(&value)
        } else {
            value
        };
        fields.push((name, value));
    }

    Ok(SubmittedForm { fields, attachments })
}

/// Maps a filename to the content type used on the outgoing attachment,
/// or `None` when the extension is not accepted.
fn accepted_content_type(filename: &str, declared: Option<&str>) -> Option<String> {
    let extension = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    if let Some(declared) = declared {
        return Some(declared.to_string());
    }
    Some(match extension.as_str() {
        "pdf" => "application/pdf".to_string(),
        _ => "image/jpeg".to_string(),
    })
}

/// Reformats an ISO date to dd/mm/yyyy; unparseable input passes through.
fn format_date_of_birth(value: &str) -> String {
    let parsed = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ"));
    match parsed {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => value.to_string(),
    }
}

/// Sends the flattened submission to the staff inbox with attachments.
async fn send_form_email(
    state: &AppState,
    route: &str,
    subject: String,
    form: SubmittedForm,
) -> Response {
    let email = notify::form_submission_alert(&state.config, subject, &form.fields)
        .with_attachments(form.attachments);

    if let Err(e) = state.mailer.send(&email).await {
        warn!(route, error = %e, "form email delivery failed");

        let failure = EmailFailure::new(
            &email.to,
            &email.subject,
            e.to_string(),
            serde_json::json!({
                "route": route,
                "fields": form.fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            }),
        );
        if let Err(db_err) = state.storage.email_failures.record(&failure).await {
            error!(error = %db_err, "failed to record email failure");
        }

        return message_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process referral.");
    }

    message_response(StatusCode::OK, "Referral received and email sent.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_date_becomes_uk_format() {
        assert_eq!(format_date_of_birth("1990-03-07"), "07/03/1990");
    }

    #[test]
    fn unparseable_date_passes_through() {
        assert_eq!(format_date_of_birth("7th of March"), "7th of March");
    }

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert_eq!(accepted_content_type("scan.PDF", None).as_deref(), Some("application/pdf"));
        assert_eq!(accepted_content_type("photo.JPG", None).as_deref(), Some("image/jpeg"));
        assert!(accepted_content_type("script.exe", None).is_none());
        assert!(accepted_content_type("noextension", None).is_none());
    }

    #[test]
    fn declared_content_type_wins() {
        assert_eq!(
            accepted_content_type("photo.jpeg", Some("image/pjpeg")).as_deref(),
            Some("image/pjpeg")
        );
    }
}
