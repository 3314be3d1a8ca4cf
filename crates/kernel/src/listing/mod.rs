//! Dynamic listing engine.
//!
//! This module provides:
//! - SortDirective / Href: client string parsers
//! - UniqueValues: criteria normalization
//! - SchemaDescriptor: per-listing tables, relations, fields and criteria
//! - JoinGraphState: lazy, exactly-once LEFT joins
//! - ListingQueryBuilder: SeaQuery-based list and count SQL
//! - ListingService: execution against PostgreSQL

pub mod criteria;
pub mod href;
pub mod join_graph;
mod listing_service;
pub mod order;
pub mod predicate;
mod query_builder;
pub mod schema;
pub mod sort;
pub mod types;

pub use criteria::{ColumnType, Criteria, UniqueValues, ValueKind};
pub use href::Href;
pub use join_graph::JoinGraphState;
pub use listing_service::{ListingError, ListingService, ServiceOptions};
pub use order::{OrderPlan, SortTerm};
pub use query_builder::ListingQueryBuilder;
pub use schema::{CriterionKind, SchemaDescriptor, SchemaError};
pub use sort::{NullsOrder, SortDirection, SortDirective};
pub use types::{ListingPage, ListingRequest};
