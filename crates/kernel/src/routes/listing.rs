//! Listing API routes.
//!
//! REST endpoints for browsing catalog listings. The query string is decoded
//! by hand so that repeated and bracketed keys accumulate into one value
//! list and a bare key (no `=`) can carry a null.

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    routing::get,
};
use serde::Serialize;

use crate::error::AppResult;
use crate::listing::{ListingPage, ListingRequest, SchemaDescriptor};
use crate::state::AppState;

/// Create the listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/listings", get(list_listings))
        .route("/api/listing/{name}", get(get_listing))
        .route("/api/listing/{name}/count", get(count_listing))
}

// -------------------------------------------------------------------------
// Response types
// -------------------------------------------------------------------------

#[derive(Serialize)]
struct ListingSummary {
    name: String,
    criteria: Vec<String>,
    fields: Vec<String>,
    cacheable: bool,
}

#[derive(Serialize)]
struct CountResponse {
    listing: String,
    total: u64,
}

// -------------------------------------------------------------------------
// Query decoding
// -------------------------------------------------------------------------

/// Paging bounds applied while decoding.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

/// Decode a raw query string into a listing request.
///
/// - `key=a&key=b` and `key[]=a&key[]=b` both yield `["a", "b"]`
/// - a bare `key` is a null value
/// - `sort` values are raw sort directives
/// - `order=<dir>` prepends `"<default field> <dir>"` for each default field
/// - `page` (1-based) and `limit` give `offset = limit * (page - 1)`
///
/// Malformed input never fails; unparsable numbers fall back to defaults.
pub fn decode_query(
    raw: Option<&str>,
    schema: &SchemaDescriptor,
    limits: PageLimits,
) -> ListingRequest {
    let mut request = ListingRequest::default();
    let mut order: Option<String> = None;
    let mut page: u64 = 1;
    let mut limit = limits.default_limit;

    // Split by hand: serde_urlencoded decodes a bare `key` and `key=` to the
    // same empty string, and the bare form is the null sentinel.
    for pair in raw.unwrap_or_default().split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), Some(decode_component(value))),
            None => (decode_component(pair), None),
        };
        let key = key.strip_suffix("[]").unwrap_or(&key);

        match key {
            "sort" => request.sort.extend(value),
            "order" => order = value,
            "page" => {
                page = value
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|p| *p > 0)
                    .unwrap_or(1);
            }
            "limit" => {
                limit = value
                    .and_then(|v| v.trim().parse().ok())
                    .filter(|l| *l > 0)
                    .unwrap_or(limits.default_limit);
            }
            _ => request.criteria.entry(key.to_string()).or_default().push(value),
        }
    }

    if let Some(direction) = order.filter(|d| !d.trim().is_empty()) {
        let prepended = schema
            .default_order()
            .iter()
            .map(|(field, _)| format!("{field} {}", direction.trim()));
        request.sort = prepended.chain(request.sort).collect();
    }

    request.limit = limit.min(limits.max_limit);
    request.offset = request.limit.saturating_mul(page - 1);
    request
}

/// Percent-decode a query component, treating `+` as a space.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

async fn list_listings(State(state): State<AppState>) -> Json<Vec<ListingSummary>> {
    let catalog = state.listings().catalog();

    Json(
        catalog
            .names()
            .filter_map(|name| catalog.get(name))
            .map(|schema| ListingSummary {
                name: schema.name().to_string(),
                criteria: schema.criteria().map(|(c, _)| c.to_string()).collect(),
                fields: schema.field_names().map(str::to_string).collect(),
                cacheable: schema.is_cacheable(),
            })
            .collect(),
    )
}

async fn get_listing(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ListingPage>> {
    let listings = state.listings();
    let schema = listings.schema(&name)?;
    let request = decode_query(query.as_deref(), schema, limits(&state));

    let page = listings.page(&name, &request).await?;
    Ok(Json(page))
}

async fn count_listing(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<CountResponse>> {
    let listings = state.listings();
    let schema = listings.schema(&name)?;
    let request = decode_query(query.as_deref(), schema, limits(&state));

    let total = listings.count(&name, &request.criteria).await?;
    Ok(Json(CountResponse {
        listing: name,
        total,
    }))
}

fn limits(state: &AppState) -> PageLimits {
    PageLimits {
        default_limit: state.default_limit(),
        max_limit: state.listings().max_limit(),
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog;

    const LIMITS: PageLimits = PageLimits {
        default_limit: 20,
        max_limit: 100,
    };

    fn decode(raw: &str) -> ListingRequest {
        decode_query(Some(raw), &catalog::comic_tags().unwrap(), LIMITS)
    }

    #[test]
    fn repeated_and_bracketed_keys_accumulate() {
        let request = decode("tagCodes[]=a&tagCodes=b&tagCodes[]=a");
        assert_eq!(
            request.criteria["tagCodes"],
            vec![Some("a".to_string()), Some("b".to_string()), Some("a".to_string())]
        );
    }

    #[test]
    fn bare_key_is_null() {
        let request = decode("tagCodes&tagCodes=");
        assert_eq!(
            request.criteria["tagCodes"],
            vec![None, Some(String::new())]
        );
    }

    #[test]
    fn sort_values_are_raw_directives() {
        let request = decode("sort[]=tagCode%20desc&sort=comicCode+order%3Dasc+nulls%3Dfirst");
        assert_eq!(
            request.sort,
            vec!["tagCode desc", "comicCode order=asc nulls=first"]
        );
    }

    #[test]
    fn order_prepends_default_fields() {
        let request = decode("sort=tagName&order=desc");
        assert_eq!(
            request.sort,
            vec!["comicCode desc", "tagTypeCode desc", "tagCode desc", "tagName"]
        );
    }

    #[test]
    fn paging_defaults_and_offsets() {
        let request = decode("");
        assert_eq!((request.limit, request.offset), (20, 0));

        let request = decode("page=3&limit=10");
        assert_eq!((request.limit, request.offset), (10, 20));

        let request = decode("page=0&limit=abc");
        assert_eq!((request.limit, request.offset), (20, 0));
    }

    #[test]
    fn limit_is_capped_before_offset() {
        let request = decode("page=2&limit=1000");
        assert_eq!((request.limit, request.offset), (100, 100));
    }

    #[test]
    fn missing_query_is_empty_request() {
        let request = decode_query(None, &catalog::comic_tags().unwrap(), LIMITS);
        assert!(request.criteria.is_empty());
        assert!(request.sort.is_empty());
    }

    #[test]
    fn invalid_percent_encoding_is_kept_raw() {
        let request = decode("comicCodes=%FF%FE");
        assert_eq!(
            request.criteria["comicCodes"],
            vec![Some("%FF%FE".to_string())]
        );
    }
}
