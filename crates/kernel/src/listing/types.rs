//! Listing request and result types.

use serde::{Deserialize, Serialize};

use super::criteria::Criteria;

/// One listing call: criteria, raw sort directives and the page window.
#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub criteria: Criteria,

    /// Raw client sort strings, parsed with
    /// [`SortDirective::parse`](super::sort::SortDirective::parse).
    pub sort: Vec<String>,

    pub limit: u64,

    pub offset: u64,
}

impl ListingRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset,
            ..Default::default()
        }
    }

    /// Add values for a criterion.
    pub fn with_criterion<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Option<String>>,
    {
        self.criteria
            .entry(name.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Append a raw sort directive.
    pub fn with_sort(mut self, raw: &str) -> Self {
        self.sort.push(raw.to_string());
        self
    }
}

/// A page of listing rows with the independently counted total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPage {
    /// Rows as JSON objects.
    pub items: Vec<serde_json::Value>,

    /// Total matching rows (before paging).
    pub total: u64,

    /// Current page number (1-indexed).
    pub page: u64,

    /// Rows per page.
    pub per_page: u64,

    /// Total number of pages.
    pub total_pages: u64,

    /// Whether there's a next page.
    pub has_next: bool,

    /// Whether there's a previous page.
    pub has_prev: bool,
}

impl ListingPage {
    /// Create a page with paging calculations from a limit/offset window.
    pub fn new(items: Vec<serde_json::Value>, total: u64, limit: u64, offset: u64) -> Self {
        let (page, total_pages) = if limit > 0 {
            (offset / limit + 1, total.div_ceil(limit))
        } else {
            (1, 1)
        };

        Self {
            items,
            total,
            page,
            per_page: limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}
