#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for HTTP integration tests.
//!
//! Routers are built with the real kernel state. [`lazy_app`] never touches
//! the database until a handler queries it, so it works without PostgreSQL;
//! [`seeded_app`] runs against a seeded schema when `DATABASE_URL` is set.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use folio_kernel::AppState;
use folio_kernel::listing::ServiceOptions;
use folio_test_utils::{TestDb, catalog_db};

pub const DEFAULT_LIMIT: u64 = 20;

/// Router over a pool pointing at a closed port.
pub fn lazy_app() -> Router {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy("postgres://folio@127.0.0.1:1/folio")
        .expect("lazy pool");
    let state = AppState::from_pool(pool, ServiceOptions::default(), DEFAULT_LIMIT)
        .expect("state");
    folio_kernel::app(state)
}

/// Router over a seeded catalog, or `None` without `DATABASE_URL`.
pub async fn seeded_app() -> Option<(TestDb, Router)> {
    let db = catalog_db().await.expect("test database")?;
    let state = AppState::from_pool(db.pool.clone(), ServiceOptions::default(), DEFAULT_LIMIT)
        .expect("state");
    Some((db, folio_kernel::app(state)))
}

/// Send a GET request and return the status with the body parsed as JSON
/// (or as a JSON string when the body is not JSON).
pub async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .expect("Failed to send request");

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}
