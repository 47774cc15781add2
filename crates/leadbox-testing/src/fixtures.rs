//! Fixture builders for common test messages.

use bytes::Bytes;
use leadbox_mailer::{Attachment, Email};

/// A plain-text enquiry alert as the enquiry handler composes it.
pub fn sample_enquiry_email() -> Email {
    Email::text(
        "noreply@example.com",
        "enquiries@example.com",
        "GENERAL Enquiry Form Submission",
        "Name: Jo Bloggs\nEmail: jo@example.com\nPhone: 07700900000\n\nMessage: Hello",
    )
    .with_reply_to("jo@example.com")
}

/// An HTML confirmation receipt as the promotion handler composes it.
pub fn sample_receipt_email() -> Email {
    Email::html(
        "noreply@example.com",
        "jo@example.com",
        "Promotion Signup Confirmation",
        "<html><body><p>Dear Jo Bloggs,</p></body></html>",
    )
}

/// A referral email carrying a PDF attachment.
pub fn sample_referral_email() -> Email {
    Email::text(
        "noreply@example.com",
        "enquiries@example.com",
        "New Orthodontic Referral",
        "referralType: Orthodontic\npatientName: Jo Bloggs",
    )
    .with_attachment(Attachment::new(
        "referral.pdf",
        "application/pdf",
        Bytes::from_static(b"%PDF-1.4 fixture"),
    ))
}
