//! Database access layer implementing the repository pattern for lead
//! persistence.
//!
//! The repository layer translates between domain models and the database
//! schema. All database operations go through these repositories; handlers
//! never issue SQL directly.

use std::sync::Arc;

use sqlx::PgPool;

pub mod email_failures;
pub mod leads;

use crate::error::Result;

/// Container for all repository instances providing unified database access.
#[derive(Clone)]
pub struct Storage {
    /// Repository for captured leads.
    pub leads: Arc<leads::Repository>,

    /// Repository for email delivery failure records.
    pub email_failures: Arc<email_failures::Repository>,
}

impl Storage {
    /// Creates a new storage instance with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self {
            leads: Arc::new(leads::Repository::new(pool.clone())),
            email_failures: Arc::new(email_failures::Repository::new(pool)),
        }
    }

    /// Performs a health check on the database connection.
    ///
    /// Used by the readiness endpoint.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.leads.pool()).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn storage_can_be_created() {
        // Instantiation only; lazy pools never connect
        let pool = sqlx::PgPool::connect_lazy("postgresql://test").unwrap();
        let _storage = Storage::new(pool);
    }
}
