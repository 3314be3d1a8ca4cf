//! PostgreSQL pool for the listing store.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

/// Create the pool. Acquiring a connection may take no longer than one
/// listing statement is allowed to run.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_millis(config.listing_statement_timeout_ms))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;

    tracing::debug!(
        max_connections = config.database_max_connections,
        "listing store pool ready"
    );
    Ok(pool)
}

/// Whether the listing store answers a trivial query.
pub async fn check_health(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "listing store health check failed");
            false
        }
    }
}
