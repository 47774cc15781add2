//! Leadbox lead-capture service.
//!
//! Main entry point for the Leadbox server. Initializes all subsystems
//! and coordinates graceful startup and shutdown.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use leadbox_api::{AppState, Config};
use leadbox_core::{storage::Storage, RealClock};
use leadbox_mailer::{Mailer, SmtpMailer};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with structured logging
    init_tracing();

    info!("Starting Leadbox lead-capture service");

    let config = Config::load()?;
    let server_addr = config.parse_server_addr()?;
    info!(
        database_url = %config.database_url_masked(),
        server_addr = %server_addr,
        max_connections = config.database_max_connections,
        smtp_host = %config.smtp_host,
        "Configuration loaded"
    );

    // Create database connection pool
    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    // Run database migrations
    run_migrations(&db_pool).await?;
    info!("Database migrations completed");

    // Wire up the email delivery stack
    let transport = SmtpMailer::new(&config.smtp_config())?;
    let mailer = Mailer::new(Arc::new(transport), config.retry_policy());
    let storage = Arc::new(Storage::new(db_pool.clone()));
    let state = AppState::new(storage, mailer, Arc::new(RealClock), Arc::new(config));

    // Start HTTP server
    let server_handle = tokio::spawn(async move {
        if let Err(e) = leadbox_api::start_server(state, server_addr).await {
            error!(error = %e, "Server failed");
        }
    });

    info!(addr = %server_addr, "Leadbox is ready to receive submissions");

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received, starting graceful shutdown");

    // Give in-flight requests time to complete
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(30)) => {
            info!("Shutdown grace period expired");
        }
        _ = server_handle => {
            info!("Server stopped");
        }
    }

    // Close database connections
    db_pool.close().await;
    info!("Database connections closed");

    info!("Leadbox shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,leadbox=debug,tower_http=debug"))
        .expect("Invalid RUST_LOG environment variable");

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<sqlx::PgPool> {
    let mut retries = 0;
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    loop {
        match PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => {
                // Verify connection works
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(_e) if retries < MAX_RETRIES => {
                retries += 1;
                info!(
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying..."
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}

/// Runs database migrations.
async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            kind TEXT NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            referrer_name TEXT,
            opt_out_emails BOOLEAN NOT NULL DEFAULT FALSE,
            source TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create leads table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS email_failures (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            recipient TEXT NOT NULL,
            subject TEXT NOT NULL,
            error TEXT NOT NULL,
            context JSONB NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create email_failures table")?;

    // Duplicate probes hit these on every signup
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_leads_kind_email
        ON leads(kind, email)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create leads email index")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_leads_kind_phone
        ON leads(kind, phone)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create leads phone index")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_email_failures_created
        ON email_failures(created_at DESC)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create email_failures index")?;

    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
