//! Repository for captured-lead database operations.
//!
//! Duplicate probes check email and phone independently so handlers can
//! return field-specific errors. A probe spans both opt-in and opt-out
//! records of the same kind; the opt-out flag only selects where a new lead
//! is stored, never narrows the duplicate check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Lead, LeadId, LeadKind},
};

/// Repository for lead database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a captured lead.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or constraints are violated.
    pub async fn insert(&self, lead: &Lead) -> Result<LeadId> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO leads (
                id, kind, full_name, email, phone,
                referrer_name, opt_out_emails, source, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(lead.id.0)
        .bind(lead.kind)
        .bind(&lead.full_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.referrer_name)
        .bind(lead.opt_out_emails)
        .bind(&lead.source)
        .bind(lead.created_at)
        .fetch_one(&*self.pool)
        .await?;

        Ok(LeadId(id))
    }

    /// Checks whether an email address is already captured for a kind.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn email_exists(&self, kind: LeadKind, email: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(SELECT 1 FROM leads WHERE kind = $1 AND email = $2)
            ",
        )
        .bind(kind)
        .bind(email)
        .fetch_one(&*self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Checks whether a phone number is already captured for a kind.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn phone_exists(&self, kind: LeadKind, phone: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(SELECT 1 FROM leads WHERE kind = $1 AND phone = $2)
            ",
        )
        .bind(kind)
        .bind(phone)
        .fetch_one(&*self.pool)
        .await?;

        Ok(exists.0)
    }

    /// Finds a lead by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn find_by_id(&self, lead_id: LeadId) -> Result<Option<Lead>> {
        let lead = sqlx::query_as::<_, Lead>(
            r"
            SELECT id, kind, full_name, email, phone,
                   referrer_name, opt_out_emails, source, created_at
            FROM leads
            WHERE id = $1
            ",
        )
        .bind(lead_id.0)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(lead)
    }

    /// Lists leads of a kind captured since the given timestamp.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn created_since(&self, kind: LeadKind, since: DateTime<Utc>) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, Lead>(
            r"
            SELECT id, kind, full_name, email, phone,
                   referrer_name, opt_out_emails, source, created_at
            FROM leads
            WHERE kind = $1 AND created_at >= $2
            ORDER BY created_at DESC
            ",
        )
        .bind(kind)
        .bind(since)
        .fetch_all(&*self.pool)
        .await?;

        Ok(leads)
    }

    /// Counts all leads of a kind.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self, kind: LeadKind) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM leads WHERE kind = $1
            ",
        )
        .bind(kind)
        .fetch_one(&*self.pool)
        .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repository_can_be_created() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _repo = Repository::new(Arc::new(pool));
    }
}
