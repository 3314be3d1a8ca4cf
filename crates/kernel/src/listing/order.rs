//! Sort directive → ORDER BY compilation.
//!
//! Compilation runs in two steps. [`compile`] resolves directives against the
//! schema and attaches the joins they need; [`OrderPlan::apply`] renders the
//! ORDER BY once all joins are known, since a fan-out join anywhere in the
//! query changes how non-root columns must be ordered.
//!
//! Per resolved directive, the rendered keys are, in order:
//! 1. preference rank (`prefer=` extension), descending
//! 2. null rank (`nulls=first|last`)
//! 3. the column itself

use sea_query::{CaseStatement, Expr, Func, Order, SelectStatement, SimpleExpr};

use super::join_graph::{JoinGraphState, column};
use super::predicate::escape_like_wildcards;
use super::sort::{NullsOrder, SortDirection, SortDirective};

/// Extension key holding `+`-separated preferred prefixes.
pub const PREFER_EXTENSION: &str = "prefer";

/// One resolved sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub field: String,
    pub alias: String,
    pub column: String,
    pub direction: SortDirection,
    pub nulls: NullsOrder,
    /// Preferred prefixes, highest priority first.
    pub preferences: Vec<String>,
}

/// Resolved ORDER BY plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPlan {
    terms: Vec<SortTerm>,
}

/// Resolve directives into an [`OrderPlan`], attaching required joins.
///
/// At most `max_sort_directives` directives are considered; the rest are
/// dropped. Directives naming unknown fields are dropped. When nothing
/// resolves, the schema's default ordering is used. Never fails.
pub fn compile(directives: &[SortDirective], joins: &mut JoinGraphState<'_>) -> OrderPlan {
    let schema = joins.schema();
    let cap = schema.max_sort_directives();
    if directives.len() > cap {
        tracing::debug!(
            listing = schema.name(),
            requested = directives.len(),
            cap,
            "truncating sort directives"
        );
    }

    let mut terms: Vec<SortTerm> = directives
        .iter()
        .take(cap)
        .filter_map(|directive| resolve(directive, joins))
        .collect();

    if terms.is_empty() {
        terms = schema
            .default_order()
            .iter()
            .filter_map(|(field, direction)| resolve(&SortDirective::bare(field, *direction), joins))
            .collect();
    }

    OrderPlan { terms }
}

fn resolve(directive: &SortDirective, joins: &mut JoinGraphState<'_>) -> Option<SortTerm> {
    let schema = joins.schema();
    let field = schema.field(&directive.field)?;
    let alias = match joins.ensure_join(&field.alias) {
        Ok(alias) => alias,
        Err(e) => {
            tracing::error!(error = %e, field = %directive.field, "sort field could not be joined");
            return None;
        }
    };

    let preferences = if schema.is_preferable(&directive.field) {
        directive
            .extension(PREFER_EXTENSION)
            .map(parse_preferences)
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    Some(SortTerm {
        field: directive.field.clone(),
        alias: alias.to_string(),
        column: field.column.clone(),
        direction: directive.direction,
        nulls: directive.nulls,
        preferences,
    })
}

/// Split a `prefer=` value into literal prefixes. LIKE wildcards are
/// stripped so a token can only ever match as a plain prefix.
pub fn parse_preferences(raw: &str) -> Vec<String> {
    raw.split('+')
        .map(|token| token.replace(['_', '%'], ""))
        .filter(|token| !token.is_empty())
        .collect()
}

impl OrderPlan {
    pub fn terms(&self) -> &[SortTerm] {
        &self.terms
    }

    /// Render ORDER BY clauses onto `query`.
    pub fn apply(&self, query: &mut SelectStatement, joins: &JoinGraphState<'_>) {
        let root = joins.schema().root_alias();
        let grouped = joins.requires_group_by();

        for term in &self.terms {
            let order = match term.direction {
                SortDirection::Desc => Order::Desc,
                SortDirection::Asc | SortDirection::Unspecified => Order::Asc,
            };

            // Grouped queries order non-root columns by their aggregate.
            let aggregated = grouped && term.alias != root;
            let row_value: SimpleExpr = column(&term.alias, &term.column).into();
            let value: SimpleExpr = match (aggregated, term.direction.is_descending()) {
                (false, _) => row_value.clone(),
                (true, true) => Func::max(row_value.clone()).into(),
                (true, false) => Func::min(row_value.clone()).into(),
            };

            // The rank is scored per row; a group ranks as its best row.
            if !term.preferences.is_empty() {
                let rank = preference_rank(&row_value, &term.preferences);
                let rank = if aggregated {
                    Func::max(rank).into()
                } else {
                    rank
                };
                query.order_by_expr(rank, Order::Desc);
            }

            match term.nulls {
                NullsOrder::First => {
                    query.order_by_expr(null_rank(&value), Order::Desc);
                }
                NullsOrder::Last => {
                    query.order_by_expr(null_rank(&value), Order::Asc);
                }
                NullsOrder::Unspecified => {}
            }

            query.order_by_expr(value, order);
        }
    }
}

/// `CASE WHEN value IS NULL THEN 1 ELSE 0 END`
fn null_rank(value: &SimpleExpr) -> SimpleExpr {
    CaseStatement::new()
        .case(Expr::expr(value.clone()).is_null(), Expr::val(1))
        .finally(Expr::val(0))
        .into()
}

/// `CASE WHEN value LIKE 'p0%' THEN n WHEN value LIKE 'p1%' THEN n-1 ... ELSE 0 END`
fn preference_rank(value: &SimpleExpr, preferences: &[String]) -> SimpleExpr {
    let count = preferences.len() as i64;
    let mut case = CaseStatement::new();
    for (i, prefix) in preferences.iter().enumerate() {
        case = case.case(
            Expr::expr(value.clone()).like(format!("{}%", escape_like_wildcards(prefix))),
            Expr::val(count - i as i64),
        );
    }
    case.finally(Expr::val(0)).into()
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::listing::schema::{SchemaDescriptor, SchemaError};
    use sea_query::{Alias, Asterisk, PostgresQueryBuilder, Query};

    fn schema(cap: usize) -> Result<SchemaDescriptor, SchemaError> {
        SchemaDescriptor::builder("comic-titles", "comic_title", "title")
            .join("comic", "title", "comic", ("comic_id", "id"))
            .join("language", "title", "language", ("language_id", "id"))
            .join_many("chapters", "comic", "comic_chapter", ("id", "comic_id"))
            .field("comicCode", "comic", "code")
            .field("language", "language", "lang")
            .field("content", "title", "content")
            .field("chapterReleasedAt", "chapters", "released_at")
            .preferable("language")
            .default_order("comicCode", SortDirection::Asc)
            .max_sort_directives(cap)
            .build()
    }

    fn directives(raw: &[&str]) -> Vec<SortDirective> {
        raw.iter().map(|r| SortDirective::parse(r)).collect()
    }

    fn render(plan: &OrderPlan, joins: &JoinGraphState<'_>) -> String {
        let mut query = Query::select();
        query
            .column((Alias::new("title"), Asterisk))
            .from_as(Alias::new("comic_title"), Alias::new("title"));
        joins.apply_joins(&mut query);
        joins.apply_group_by(&mut query);
        plan.apply(&mut query, joins);
        query.to_string(PostgresQueryBuilder)
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["nope desc", "content desc"]), &mut joins);
        assert_eq!(plan.terms().len(), 1);
        assert_eq!(plan.terms()[0].field, "content");
        assert_eq!(joins.join_count(), 0);
    }

    #[test]
    fn default_order_when_nothing_resolves() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["bogus"]), &mut joins);
        assert_eq!(plan.terms().len(), 1);
        assert_eq!(plan.terms()[0].field, "comicCode");
        assert!(joins.is_attached("comic"));

        let sql = render(&plan, &joins);
        assert!(sql.contains(r#"ORDER BY "comic"."code" ASC"#), "{sql}");
    }

    #[test]
    fn directives_beyond_cap_are_truncated() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let raw: Vec<&str> = std::iter::repeat_n("content desc", 20).collect();
        let plan = compile(&directives(&raw), &mut joins);
        assert_eq!(plan.terms().len(), 8);
    }

    #[test]
    fn nulls_first_ranks_before_column() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["content order=asc nulls=first"]), &mut joins);
        let sql = render(&plan, &joins);
        let rank = sql
            .find(r#"CASE WHEN ("title"."content" IS NULL) THEN 1 ELSE 0 END) DESC"#)
            .unwrap_or_else(|| panic!("missing null rank: {sql}"));
        let col = sql
            .find(r#""title"."content" ASC"#)
            .unwrap_or_else(|| panic!("missing column order: {sql}"));
        assert!(rank < col, "{sql}");
    }

    #[test]
    fn nulls_last_ranks_ascending() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["content order=desc nulls=last"]), &mut joins);
        let sql = render(&plan, &joins);
        assert!(
            sql.contains(r#"CASE WHEN ("title"."content" IS NULL) THEN 1 ELSE 0 END) ASC"#),
            "{sql}"
        );
        assert!(sql.contains(r#""title"."content" DESC"#), "{sql}");
    }

    #[test]
    fn preference_rank_scores_in_order() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["language prefer=en+fr"]), &mut joins);
        assert_eq!(plan.terms()[0].preferences, vec!["en", "fr"]);

        let sql = render(&plan, &joins);
        assert!(sql.contains(r#"("language"."lang" LIKE 'en%') THEN 2"#), "{sql}");
        assert!(sql.contains(r#"("language"."lang" LIKE 'fr%') THEN 1"#), "{sql}");
        assert!(sql.contains("ELSE 0 END) DESC"), "{sql}");
        let rank = sql.find("CASE WHEN").unwrap();
        let col = sql.find(r#""language"."lang" ASC"#).unwrap();
        assert!(rank < col, "{sql}");
    }

    #[test]
    fn preference_ignored_on_non_preferable_field() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["content prefer=a"]), &mut joins);
        assert!(plan.terms()[0].preferences.is_empty());
    }

    #[test]
    fn preference_tokens_lose_wildcards() {
        assert_eq!(parse_preferences("e_n+%fr+"), vec!["en", "fr"]);
        assert_eq!(parse_preferences("%_"), Vec::<String>::new());
    }

    #[test]
    fn grouped_queries_aggregate_non_root_columns() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(
            &directives(&["chapterReleasedAt order=desc", "content"]),
            &mut joins,
        );
        assert!(joins.requires_group_by());
        let sql = render(&plan, &joins);
        assert!(sql.contains(r#"MAX("chapters"."released_at") DESC"#), "{sql}");
        assert!(sql.contains(r#""title"."content" ASC"#), "{sql}");
    }

    #[test]
    fn grouped_preference_ranks_rows_before_aggregating() {
        let schema = SchemaDescriptor::builder("comics", "comic", "comic")
            .join_many("titles", "comic", "comic_title", ("id", "comic_id"))
            .join("language", "titles", "language", ("language_id", "id"))
            .field("code", "comic", "code")
            .field("titleLanguage", "language", "lang")
            .preferable("titleLanguage")
            .default_order("code", SortDirection::Asc)
            .build()
            .unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(
            &directives(&["titleLanguage order=desc prefer=en"]),
            &mut joins,
        );
        assert!(joins.requires_group_by());

        let mut query = Query::select();
        query
            .column((Alias::new("comic"), Asterisk))
            .from_as(Alias::new("comic"), Alias::new("comic"));
        joins.apply_joins(&mut query);
        joins.apply_group_by(&mut query);
        plan.apply(&mut query, &joins);
        let sql = query.to_string(PostgresQueryBuilder);

        assert!(
            sql.contains(
                r#"MAX((CASE WHEN ("language"."lang" LIKE 'en%') THEN 1 ELSE 0 END)) DESC"#
            ),
            "{sql}"
        );
        assert!(sql.contains(r#"MAX("language"."lang") DESC"#), "{sql}");
        assert!(!sql.contains(r#"(MAX("language"."lang") LIKE"#), "{sql}");
    }

    #[test]
    fn unspecified_direction_renders_ascending() {
        let schema = schema(8).unwrap();
        let mut joins = JoinGraphState::new(&schema);
        let plan = compile(&directives(&["content order=sideways"]), &mut joins);
        let sql = render(&plan, &joins);
        assert!(sql.contains(r#"ORDER BY "title"."content" ASC"#), "{sql}");
    }
}
