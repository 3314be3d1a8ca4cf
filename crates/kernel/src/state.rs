//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::db;
use crate::listing::{ListingService, ServiceOptions};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Listing execution over the catalog.
    listings: Arc<ListingService>,

    /// Rows per page when the client sends no `limit`.
    default_limit: u64,
}

impl AppState {
    /// Connect to the database and build the catalog.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        Self::from_pool(db, config.service_options(), config.listing_default_limit)
    }

    /// Build state around an existing pool.
    pub fn from_pool(db: PgPool, options: ServiceOptions, default_limit: u64) -> Result<Self> {
        let catalog = Catalog::new().context("listing catalog is invalid")?;
        info!(listings = catalog.len(), "listing catalog built");

        let listings = ListingService::new(db.clone(), Arc::new(catalog), options);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db,
                listings,
                default_limit: default_limit.clamp(1, options.max_limit.max(1)),
            }),
        })
    }

    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub fn listings(&self) -> &ListingService {
        &self.inner.listings
    }

    pub fn default_limit(&self) -> u64 {
        self.inner.default_limit
    }
}
