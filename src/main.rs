//! Credential Rotation Service - Main Application Entry Point
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Bearer token with SHA-256 hashing, role-based admin checks
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Seed the bootstrap admin, if configured
//! 5. Start the daily quota reset task, if enabled
//! 6. Start server on configured port

use credential_rotation_service::{
    config, db, routes,
    services::{quota_scheduler, user_service},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(
        port = config.server_port,
        quota_reset_enabled = config.quota_reset_enabled,
        "Configuration loaded"
    );

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    if let Some(token) = config.admin_bootstrap_token.as_deref() {
        let admin = user_service::ensure_admin(&pool, &config.admin_bootstrap_email, token).await?;
        tracing::info!(user_id = %admin.id, email = %admin.email, "Bootstrap admin ready");
    }

    if config.quota_reset_enabled {
        quota_scheduler::spawn(pool.clone(), config.quota_reset_hour_utc);
    } else {
        tracing::info!("In-process quota reset disabled; expecting external scheduler");
    }

    let app = routes::build_router(pool);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
