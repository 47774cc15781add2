//! Notification email composition.
//!
//! Templates for the two message families every form produces: an HTML
//! confirmation receipt to the submitter and a plain-text internal alert to
//! the staff inbox. The sender does not care which is which; composition is
//! the only place message semantics live.

use leadbox_mailer::Email;

use crate::Config;

/// Composes the HTML confirmation receipt sent to a promotion signup.
///
/// The logo header and social footer render only for links present in
/// the configuration, so an unbranded deployment sends a clean receipt.
pub fn signup_receipt(config: &Config, to: &str, name: &str, phone: &str) -> Email {
    let logo = config
        .logo_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<div class="logo"><img src="{url}" alt="Practice logo" style="max-width: 100px;"/></div>"#
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<html>
  <head>
    <style>
      body {{ font-family: Arial, sans-serif; margin: 20px; color: #333; }}
      .container {{ max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; background-color: #f9f9f9; }}
      h1 {{ color: #DAA520; }}
      .social-links a {{ margin-right: 10px; }}
      .footer {{ margin-top: 20px; font-size: 0.9em; color: #777; }}
    </style>
  </head>
  <body>
    <div class="container">
      {logo}
      <h1>Thank You for Signing Up!</h1>
      <p>Dear {name},</p>
      <p>Thank you for signing up for our promotion! We have received the following details:</p>
      <p><strong>Full Name:</strong> {name}</p>
      <p><strong>Phone Number:</strong> {phone}</p>
      <p>Best regards, <br> Your Team</p>
      {social}
      <div class="footer">
        <p>If you have any questions, feel free to contact us at {notify}.</p>
      </div>
    </div>
  </body>
</html>"#,
        logo = logo,
        name = name,
        phone = phone,
        social = social_links(config),
        notify = config.notify_address,
    );

    Email::html(&config.email_from, to, "Promotion Signup Confirmation", html)
}

/// Renders the social-media footer block, empty when no links are set.
fn social_links(config: &Config) -> String {
    let anchors: Vec<String> = [
        (config.instagram_url.as_deref(), "Instagram"),
        (config.facebook_url.as_deref(), "Facebook"),
    ]
    .into_iter()
    .filter_map(|(url, label)| {
        url.map(|url| format!(r#"<a href="{url}" target="_blank">{label}</a>"#))
    })
    .collect();

    if anchors.is_empty() {
        return String::new();
    }

    format!(
        "<p>Keep up to date with us on social media!</p>\n      <div class=\"social-links\">{}</div>",
        anchors.join(" ")
    )
}

/// Composes the internal staff alert for a new signup.
///
/// Field names are capitalized; absent values render as `N/A` so the alert
/// always has the same shape. Referral alerts carry a `New Website Signup`
/// subject so staff can tell the two streams apart in the inbox.
pub fn signup_alert(
    config: &Config,
    referrer_name: Option<&str>,
    full_name: &str,
    email: &str,
    phone: &str,
    opt_out_emails: bool,
    source: Option<&str>,
) -> Email {
    let base = if referrer_name.is_some() { "New Website Signup" } else { "Website Signup" };
    let subject = match source {
        Some(source) => format!("{base} from {source}"),
        None => base.to_string(),
    };

    let mut body = String::new();
    if let Some(referrer) = referrer_name {
        body.push_str(&format!("Referrer Name: {referrer}\n"));
    }
    body.push_str(&format!(
        "Full Name: {full_name}\nEmail: {email}\nPhone: {phone}\nOpt-Out of Emails: {opt_out_emails}\nSource: {}",
        source.unwrap_or("N/A"),
    ));

    Email::text(&config.email_from, &config.notify_address, subject, body)
}

/// Composes an internal email from arbitrary form fields.
///
/// Used by the free-form handlers (referrals, careers): each submitted
/// field becomes one `Key: value` line, keys capitalized, empty values
/// skipped.
pub fn form_submission_alert(
    config: &Config,
    subject: impl Into<String>,
    fields: &[(String, String)],
) -> Email {
    Email::text(&config.email_from, &config.notify_address, subject, flatten_fields(fields))
}

/// Flattens form fields into `Key: value` lines with capitalized keys.
pub fn flatten_fields(fields: &[(String, String)]) -> String {
    fields
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}: {value}", capitalize(key)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
