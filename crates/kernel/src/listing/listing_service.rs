//! Listing service for executing listing queries.
//!
//! Provides high-level execution with:
//! - listing lookup in the catalog
//! - limit capping
//! - per-statement timeouts
//! - optional result caching for cacheable listings

use std::sync::Arc;

use sqlx::PgPool;

use super::criteria::Criteria;
use super::query_builder::ListingQueryBuilder;
use super::schema::SchemaDescriptor;
use super::types::{ListingPage, ListingRequest};
use crate::cache::ResultCache;
use crate::catalog::Catalog;

/// Default per-statement timeout in milliseconds.
pub const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default upper bound on rows per listing call.
pub const DEFAULT_MAX_LIMIT: u64 = 100;

/// Errors raised while executing a listing.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("unknown listing: {0}")]
    UnknownListing(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Execution settings.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub statement_timeout_ms: u64,
    pub max_limit: u64,
    /// Result cache TTL; 0 disables caching.
    pub cache_ttl_secs: u64,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            statement_timeout_ms: DEFAULT_STATEMENT_TIMEOUT_MS,
            max_limit: DEFAULT_MAX_LIMIT,
            cache_ttl_secs: 0,
        }
    }
}

/// Service for executing listings against the catalog.
pub struct ListingService {
    pool: PgPool,
    catalog: Arc<Catalog>,
    cache: Option<ResultCache>,
    options: ServiceOptions,
}

impl ListingService {
    /// Create a new ListingService.
    pub fn new(pool: PgPool, catalog: Arc<Catalog>, options: ServiceOptions) -> Arc<Self> {
        Arc::new(Self {
            pool,
            catalog,
            cache: ResultCache::new(options.cache_ttl_secs),
            options,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn max_limit(&self) -> u64 {
        self.options.max_limit
    }

    pub fn schema(&self, name: &str) -> Result<&SchemaDescriptor, ListingError> {
        self.catalog
            .get(name)
            .ok_or_else(|| ListingError::UnknownListing(name.to_string()))
    }

    /// Fetch one page of rows.
    pub async fn list(
        &self,
        name: &str,
        request: &ListingRequest,
    ) -> Result<Vec<serde_json::Value>, ListingError> {
        let schema = self.schema(name)?;
        let limit = self.cap_limit(name, request.limit);

        let sql = ListingQueryBuilder::new(schema, &request.criteria)
            .with_sort(&request.sort)
            .list_sql(limit, request.offset);
        let cache = self.cache_for(schema);

        if let Some(cache) = cache
            && let Some(rows) = cache.get_rows(&sql).await
        {
            return Ok(rows.as_ref().clone());
        }

        tracing::debug!(listing = name, sql = %sql, "executing listing query");
        let mut tx = self.pool.begin().await?;
        self.set_timeout(&mut tx).await?;
        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar(&format!("SELECT row_to_json(t) FROM ({sql}) t"))
                .fetch_all(&mut *tx)
                .await?;
        tx.commit().await?;

        if let Some(cache) = cache {
            cache.put_rows(&sql, Arc::new(rows.clone())).await;
        }

        Ok(rows)
    }

    /// Count rows matching `criteria`, ignoring sort and paging.
    pub async fn count(&self, name: &str, criteria: &Criteria) -> Result<u64, ListingError> {
        let schema = self.schema(name)?;
        let sql = ListingQueryBuilder::new(schema, criteria).count_sql();
        let cache = self.cache_for(schema);

        if let Some(cache) = cache
            && let Some(total) = cache.get_count(&sql).await
        {
            return Ok(total);
        }

        tracing::debug!(listing = name, sql = %sql, "executing count query");
        let mut tx = self.pool.begin().await?;
        self.set_timeout(&mut tx).await?;
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        let total = u64::try_from(total).unwrap_or_default();
        if let Some(cache) = cache {
            cache.put_count(&sql, total).await;
        }

        Ok(total)
    }

    /// Fetch a page together with the total count.
    ///
    /// The two queries run independently and are not atomic with respect to
    /// each other.
    pub async fn page(
        &self,
        name: &str,
        request: &ListingRequest,
    ) -> Result<ListingPage, ListingError> {
        let limit = self.cap_limit(name, request.limit);
        let (items, total) = tokio::try_join!(
            self.list(name, request),
            self.count(name, &request.criteria)
        )?;

        Ok(ListingPage::new(items, total, limit, request.offset))
    }

    fn cap_limit(&self, name: &str, limit: u64) -> u64 {
        if limit > self.options.max_limit {
            tracing::warn!(
                listing = name,
                requested = limit,
                max = self.options.max_limit,
                "limit exceeds maximum, capping"
            );
            self.options.max_limit
        } else {
            limit
        }
    }

    fn cache_for(&self, schema: &SchemaDescriptor) -> Option<&ResultCache> {
        self.cache.as_ref().filter(|_| schema.is_cacheable())
    }

    /// Apply the statement timeout for the current transaction only.
    async fn set_timeout(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.options.statement_timeout_ms
        ))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
