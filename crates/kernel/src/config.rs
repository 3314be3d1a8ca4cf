//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

use crate::listing::ServiceOptions;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Rows per page when the client sends no `limit` (default: 20).
    pub listing_default_limit: u64,

    /// Upper bound on rows per page (default: 100).
    pub listing_max_limit: u64,

    /// Per-statement timeout for listing queries (default: 10000 ms).
    pub listing_statement_timeout_ms: u64,

    /// TTL of the listing result cache; 0 disables it (default: 0).
    pub listing_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let listing_default_limit = parse_u64("LISTING_DEFAULT_LIMIT", 20)?;
        let listing_max_limit = parse_u64("LISTING_MAX_LIMIT", 100)?;
        let listing_statement_timeout_ms = parse_u64("LISTING_STATEMENT_TIMEOUT_MS", 10_000)?;
        let listing_cache_ttl_secs = parse_u64("LISTING_CACHE_TTL_SECS", 0)?;

        if listing_max_limit == 0 {
            anyhow::bail!("LISTING_MAX_LIMIT must be at least 1");
        }

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            // The default never exceeds the cap.
            listing_default_limit: listing_default_limit.clamp(1, listing_max_limit),
            listing_max_limit,
            listing_statement_timeout_ms,
            listing_cache_ttl_secs,
        })
    }

    /// Execution settings for the listing service.
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            statement_timeout_ms: self.listing_statement_timeout_ms,
            max_limit: self.listing_max_limit,
            cache_ttl_secs: self.listing_cache_ttl_secs,
        }
    }
}

fn parse_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}
