//! Repository for email delivery failure records.
//!
//! A row is written when the sender exhausts its retry budget so the
//! submission is never silently lost; staff work the backlog manually.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{EmailFailure, FailureId},
};

/// Repository for email failure database operations.
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

    /// Records a delivery failure.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn record(&self, failure: &EmailFailure) -> Result<FailureId> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO email_failures (id, recipient, subject, error, context, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(failure.id.0)
        .bind(&failure.recipient)
        .bind(&failure.subject)
        .bind(&failure.error)
        .bind(&failure.context)
        .bind(failure.created_at)
        .fetch_one(&*self.pool)
        .await?;

        Ok(FailureId(id))
    }

    /// Lists the most recent failures.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn recent(&self, limit: Option<i64>) -> Result<Vec<EmailFailure>> {
        let failures = sqlx::query_as::<_, EmailFailure>(
            r"
            SELECT id, recipient, subject, error, context, created_at
            FROM email_failures
            ORDER BY created_at DESC
            LIMIT $1
            ",
        )
        .bind(limit.unwrap_or(100))
        .fetch_all(&*self.pool)
        .await?;

        Ok(failures)
    }

    /// Counts all recorded failures.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM email_failures
            ",
        )
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
