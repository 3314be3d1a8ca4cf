//! Folio catalog kernel library.
//!
//! This library exposes the listing engine, the catalog descriptors and the
//! HTTP routes for integration testing. The main entry point for running the
//! server is the `folio` binary.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod routes;
pub mod state;

pub use catalog::Catalog;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the application router with tracing and state attached.
pub fn app(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
