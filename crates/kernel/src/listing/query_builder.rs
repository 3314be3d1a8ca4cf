//! Listing query builder using SeaQuery.
//!
//! Assembles the list and count statements for one request:
//! - root `SELECT alias.* FROM table AS alias`
//! - LEFT joins attached on demand by criteria and sort terms
//! - criterion predicates, ANDed in schema declaration order
//! - `GROUP BY root.pk` when a fan-out relation is joined
//! - ORDER BY, LIMIT and OFFSET (list only)

use sea_query::{Alias, Asterisk, Expr, PostgresQueryBuilder, Query, SelectStatement};

use super::criteria::Criteria;
use super::join_graph::{JoinGraphState, column};
use super::order;
use super::predicate::build_predicate;
use super::schema::SchemaDescriptor;
use super::sort::SortDirective;

/// Query builder for one listing request.
pub struct ListingQueryBuilder<'a> {
    schema: &'a SchemaDescriptor,
    criteria: &'a Criteria,
    directives: Vec<SortDirective>,
}

impl<'a> ListingQueryBuilder<'a> {
    pub fn new(schema: &'a SchemaDescriptor, criteria: &'a Criteria) -> Self {
        Self {
            schema,
            criteria,
            directives: Vec::new(),
        }
    }

    /// Parse raw sort strings into directives.
    pub fn with_sort(mut self, raw: &[String]) -> Self {
        self.directives = raw.iter().map(|r| SortDirective::parse(r)).collect();
        self
    }

    /// Build the paged listing statement.
    pub fn build_list(&self, limit: u64, offset: u64) -> SelectStatement {
        let mut joins = JoinGraphState::new(self.schema);
        let mut query = self.root_select();
        query.column((Alias::new(self.schema.root_alias()), Asterisk));

        self.add_filters(&mut query, &mut joins);
        let plan = order::compile(&self.directives, &mut joins);

        joins.apply_joins(&mut query);
        joins.apply_group_by(&mut query);
        plan.apply(&mut query, &joins);

        query.limit(limit);
        query.offset(offset);
        query
    }

    /// Build a COUNT statement with the same filters and no ordering.
    ///
    /// Sort-only joins never change the row count: they are LEFT joins, and a
    /// fan-out join collapses back to one row per root under `GROUP BY`.
    pub fn build_count(&self) -> SelectStatement {
        let mut joins = JoinGraphState::new(self.schema);
        let mut filtered = self.root_select();

        self.add_filters(&mut filtered, &mut joins);
        joins.apply_joins(&mut filtered);

        let root_key = column(self.schema.root_alias(), self.schema.primary_key());
        if joins.requires_group_by() {
            filtered.expr(root_key);
            joins.apply_group_by(&mut filtered);

            let mut query = Query::select();
            query
                .expr(Expr::col(Asterisk).count())
                .from_subquery(filtered, Alias::new("grouped"));
            query
        } else {
            filtered.expr(root_key.count());
            filtered
        }
    }

    /// Render the listing statement with inlined, escaped values.
    pub fn list_sql(&self, limit: u64, offset: u64) -> String {
        self.build_list(limit, offset).to_string(PostgresQueryBuilder)
    }

    /// Render the count statement with inlined, escaped values.
    pub fn count_sql(&self) -> String {
        self.build_count().to_string(PostgresQueryBuilder)
    }

    fn root_select(&self) -> SelectStatement {
        let mut query = Query::select();
        query.from_as(
            Alias::new(self.schema.root_table()),
            Alias::new(self.schema.root_alias()),
        );
        query
    }

    fn add_filters(&self, query: &mut SelectStatement, joins: &mut JoinGraphState<'a>) {
        for name in self.criteria.keys() {
            if self.schema.criterion(name).is_none() {
                tracing::debug!(
                    criterion = %name,
                    listing = self.schema.name(),
                    "ignoring unknown criterion"
                );
            }
        }

        for (name, _) in self.schema.criteria() {
            let Some(values) = self.criteria.get(name) else {
                continue;
            };
            if let Some(predicate) = build_predicate(name, values, joins) {
                query.and_where(predicate);
            }
        }
    }
}
