//! Domain models for captured leads and email delivery failures.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed lead identifier.
///
/// Wraps a UUID to prevent mixing with other ID types. Leads are immutable
/// once captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub Uuid);

impl LeadId {
    /// Creates a new random lead ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LeadId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for LeadId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for LeadId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for LeadId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Strongly-typed email-failure record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureId(pub Uuid);

impl FailureId {
    /// Creates a new random failure ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FailureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FailureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FailureId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for FailureId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for FailureId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for FailureId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Which capture flow produced a lead.
///
/// Promotion signups and refer-a-friend referrals share a table but are
/// deduplicated independently per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadKind {
    /// Promotion signup form.
    Promotion,
    /// Refer-a-friend form (carries a referrer name).
    ReferAFriend,
}

impl fmt::Display for LeadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Promotion => write!(f, "promotion"),
            Self::ReferAFriend => write!(f, "refer_a_friend"),
        }
    }
}

impl std::str::FromStr for LeadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promotion" => Ok(Self::Promotion),
            "refer_a_friend" => Ok(Self::ReferAFriend),
            other => Err(format!("unknown lead kind: {other}")),
        }
    }
}

impl sqlx::Type<PgDb> for LeadKind {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for LeadKind {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<PgDb>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

impl sqlx::Encode<'_, PgDb> for LeadKind {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// A captured lead from one of the signup forms.
///
/// Immutable after capture; duplicate submissions never update an existing
/// row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    /// Unique identifier.
    pub id: LeadId,
    /// Capture flow that produced this lead.
    pub kind: LeadKind,
    /// Submitter full name.
    pub full_name: String,
    /// Submitter email address.
    pub email: String,
    /// Submitter phone number.
    pub phone: String,
    /// Name of the referring patient, for refer-a-friend leads.
    pub referrer_name: Option<String>,
    /// Whether the submitter opted out of marketing emails.
    pub opt_out_emails: bool,
    /// Site page the form was submitted from, if provided.
    pub source: Option<String>,
    /// When the lead was captured.
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a new promotion lead.
    pub fn promotion(
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        opt_out_emails: bool,
        source: Option<String>,
    ) -> Self {
        Self {
            id: LeadId::new(),
            kind: LeadKind::Promotion,
            full_name: full_name.into(),
            email: email.into(),
            phone: phone.into(),
            referrer_name: None,
            opt_out_emails,
            source,
            created_at: Utc::now(),
        }
    }

    /// Creates a new refer-a-friend lead.
    pub fn referral(
        referrer_name: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        opt_out_emails: bool,
        source: Option<String>,
    ) -> Self {
        Self {
            id: LeadId::new(),
            kind: LeadKind::ReferAFriend,
            full_name: full_name.into(),
            email: email.into(),
            phone: phone.into(),
            referrer_name: Some(referrer_name.into()),
            opt_out_emails,
            source,
            created_at: Utc::now(),
        }
    }
}

/// Record of a notification email that exhausted its delivery retries.
///
/// Written by handlers when the sender returns a terminal failure so staff
/// can follow up manually.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailFailure {
    /// Unique identifier.
    pub id: FailureId,
    /// Intended recipient address.
    pub recipient: String,
    /// Subject of the email that failed.
    pub subject: String,
    /// Last transport error observed.
    pub error: String,
    /// Submission data the email was about, for manual follow-up.
    pub context: serde_json::Value,
    /// When the failure was recorded.
    pub created_at: DateTime<Utc>,
}

impl EmailFailure {
    /// Creates a new failure record.
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        error: impl Into<String>,
        context: serde_json::Value,
    ) -> Self {
        Self {
            id: FailureId::new(),
            recipient: recipient.into(),
            subject: subject.into(),
            error: error.into(),
            context,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn lead_kind_display_round_trips() {
        for kind in [LeadKind::Promotion, LeadKind::ReferAFriend] {
            let text = kind.to_string();
            assert_eq!(LeadKind::from_str(&text).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_lead_kind_rejected() {
        assert!(LeadKind::from_str("walk_in").is_err());
    }

    #[test]
    fn promotion_lead_has_no_referrer() {
        let lead = Lead::promotion("Jo Bloggs", "jo@example.com", "07700900000", false, None);
        assert_eq!(lead.kind, LeadKind::Promotion);
        assert!(lead.referrer_name.is_none());
    }

    #[test]
    fn referral_lead_keeps_referrer_and_source() {
        let lead = Lead::referral(
            "Sam Referrer",
            "Jo Bloggs",
            "jo@example.com",
            "07700900000",
            true,
            Some("invisalign".to_string()),
        );
        assert_eq!(lead.kind, LeadKind::ReferAFriend);
        assert_eq!(lead.referrer_name.as_deref(), Some("Sam Referrer"));
        assert_eq!(lead.source.as_deref(), Some("invisalign"));
        assert!(lead.opt_out_emails);
    }

    #[test]
    fn failure_record_carries_context() {
        let failure = EmailFailure::new(
            "staff@example.com",
            "Website Signup",
            "connection refused",
            serde_json::json!({"email": "jo@example.com"}),
        );
        assert_eq!(failure.context["email"], "jo@example.com");
    }
}
