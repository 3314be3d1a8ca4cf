//! Criterion → WHERE predicate translation.

use sea_query::{Cond, Expr, SimpleExpr, Value};

use super::criteria::{ColumnType, Selection, UniqueValues, parse_flag};
use super::href::Href;
use super::join_graph::JoinGraphState;
use super::schema::{CriterionKind, FieldRef};

/// Build the predicate for one named criterion.
///
/// Returns `None` when the criterion is unknown to the schema or its values
/// select nothing. Joins are only attached when a predicate is produced.
///
/// Values that cannot be stored in the filtered column match no row; when
/// every value is such a value the predicate is `FALSE`.
pub fn build_predicate(
    name: &str,
    values: &[Option<String>],
    joins: &mut JoinGraphState<'_>,
) -> Option<SimpleExpr> {
    let schema = joins.schema();
    let kind = schema.criterion(name)?;
    let column_type = match kind {
        CriterionKind::Equals(field) => schema.field(field)?.column_type,
        _ => ColumnType::Text,
    };
    let unique = UniqueValues::normalize(values, kind.value_kind(), column_type);
    if unique.is_empty() {
        if unique.rejected() > 0 {
            tracing::debug!(criterion = name, listing = schema.name(), "no value fits the column");
            return Some(Expr::val(false).into());
        }
        return None;
    }

    match kind {
        CriterionKind::Equals(field) | CriterionKind::RelativeReference(field) => {
            let col = field_column(field, joins)?;
            membership(col, &unique, column_type)
        }
        CriterionKind::Prefix(field) => {
            let prefixes: Vec<&str> = unique.present().filter(|p| !p.is_empty()).collect();
            if prefixes.is_empty() {
                return None;
            }
            let col = field_column(field, joins)?;
            let mut cond = Cond::any();
            for prefix in prefixes {
                cond = cond.add(col.clone().like(format!("{}%", escape_like_wildcards(prefix))));
            }
            Some(cond.into())
        }
        CriterionKind::Exists(field) => {
            let mut wanted = unique.present().filter_map(parse_flag);
            let first = wanted.next()?;
            // Contradictory flags select everything.
            if wanted.any(|flag| flag != first) {
                return None;
            }
            let col = field_column(field, joins)?;
            Some(if first { col.is_not_null() } else { col.is_null() })
        }
        CriterionKind::Href { host, reference } => {
            let hrefs: Vec<Href> = unique.present().map(Href::parse).collect();
            if hrefs.is_empty() {
                return None;
            }
            let host_col = field_column(host, joins)?;
            let reference_col = field_column(reference, joins)?;
            let mut cond = Cond::any();
            for href in &hrefs {
                cond = cond.add(
                    Cond::all()
                        .add(host_col.clone().eq(href.host.as_str()))
                        .add(reference_col.clone().eq(href.stored_reference())),
                );
            }
            Some(cond.into())
        }
    }
}

/// Equality for one value, `IN` for several; nulls become `IS NULL`.
fn membership(col: Expr, values: &UniqueValues, column_type: ColumnType) -> Option<SimpleExpr> {
    match values.selection() {
        Selection::Skip => None,
        Selection::Equal(Some(value)) => Some(col.eq(literal(value, column_type))),
        Selection::Equal(None) => Some(col.is_null()),
        Selection::In(_) => {
            let present: Vec<Value> = values
                .present()
                .map(|value| literal(value, column_type))
                .collect();
            let in_list = col.clone().is_in(present);
            if values.contains_null() {
                Some(Cond::any().add(in_list).add(col.is_null()).into())
            } else {
                Some(in_list)
            }
        }
    }
}

fn field_column(field: &str, joins: &mut JoinGraphState<'_>) -> Option<Expr> {
    let schema = joins.schema();
    let field_ref: &FieldRef = schema.field(field)?;
    match joins.ensure_field(field_ref) {
        Ok(col) => Some(col),
        Err(e) => {
            tracing::error!(error = %e, field, "criterion field could not be joined");
            None
        }
    }
}

/// Typed literal for a normalized value.
fn literal(value: &str, column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::Text => value.into(),
        ColumnType::Integer => value.parse::<i64>().map_or_else(|_| value.into(), Value::from),
        ColumnType::Boolean => parse_flag(value).map_or_else(|| value.into(), Value::from),
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
pub(crate) fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::listing::schema::SchemaDescriptor;
    use sea_query::{Alias, Asterisk, PostgresQueryBuilder, Query};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::builder("links", "link", "link")
            .join("website", "link", "website", ("website_id", "id"))
            .join_many("externals", "link", "comic_external", ("id", "link_id"))
            .field("websiteHost", "website", "host")
            .field("relativeReference", "link", "relative_reference")
            .field("externalId", "externals", "id")
            .typed_field("linkId", "link", "id", ColumnType::Integer)
            .typed_field("featured", "link", "featured", ColumnType::Boolean)
            .criterion("websiteHosts", CriterionKind::Equals("websiteHost".into()))
            .criterion(
                "relativeReferences",
                CriterionKind::RelativeReference("relativeReference".into()),
            )
            .criterion(
                "hrefs",
                CriterionKind::Href {
                    host: "websiteHost".into(),
                    reference: "relativeReference".into(),
                },
            )
            .criterion("used", CriterionKind::Exists("externalId".into()))
            .criterion("hostPrefix", CriterionKind::Prefix("websiteHost".into()))
            .criterion("linkIds", CriterionKind::Equals("linkId".into()))
            .criterion("featured", CriterionKind::Equals("featured".into()))
            .build()
            .unwrap()
    }

    fn vals(raw: &[Option<&str>]) -> Vec<Option<String>> {
        raw.iter().map(|v| v.map(str::to_string)).collect()
    }

    fn render(expr: SimpleExpr) -> String {
        Query::select()
            .column((Alias::new("link"), Asterisk))
            .from_as(Alias::new("link"), Alias::new("link"))
            .and_where(expr)
            .to_string(PostgresQueryBuilder)
    }

    #[test]
    fn single_value_uses_equality() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr =
            build_predicate("websiteHosts", &vals(&[Some("a.com"), Some("a.com")]), &mut joins)
                .unwrap();
        let sql = render(expr);
        assert!(sql.contains(r#""website"."host" = 'a.com'"#), "{sql}");
        assert!(!sql.contains(" IN "), "{sql}");
        assert_eq!(joins.join_count(), 1);
    }

    #[test]
    fn several_values_use_in() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr =
            build_predicate("websiteHosts", &vals(&[Some("a.com"), Some("b.com")]), &mut joins)
                .unwrap();
        let sql = render(expr);
        assert!(sql.contains(r#""website"."host" IN ('a.com', 'b.com')"#), "{sql}");
    }

    #[test]
    fn empty_values_skip_predicate_and_join() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        assert!(build_predicate("websiteHosts", &[], &mut joins).is_none());
        assert_eq!(joins.join_count(), 0);
    }

    #[test]
    fn unknown_criterion_is_ignored() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        assert!(build_predicate("colour", &vals(&[Some("red")]), &mut joins).is_none());
    }

    #[test]
    fn relative_reference_null_matches_stored_default() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr = build_predicate("relativeReferences", &vals(&[None]), &mut joins).unwrap();
        let sql = render(expr);
        assert!(sql.contains(r#""link"."relative_reference" = ''"#), "{sql}");
    }

    #[test]
    fn relative_reference_both_sentinels() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr =
            build_predicate("relativeReferences", &vals(&[None, Some("")]), &mut joins).unwrap();
        let sql = render(expr);
        assert!(sql.contains(r#""link"."relative_reference" IN ('')"#), "{sql}");
        assert!(sql.contains(r#""link"."relative_reference" IS NULL"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn href_values_become_disjunction_of_pairs() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr = build_predicate(
            "hrefs",
            &vals(&[Some("example.com/a/b"), Some("//mangadex.org")]),
            &mut joins,
        )
        .unwrap();
        let sql = render(expr);
        assert!(sql.contains(r#""website"."host" = 'example.com'"#), "{sql}");
        assert!(sql.contains(r#""link"."relative_reference" = '/a/b'"#), "{sql}");
        assert!(sql.contains(r#""website"."host" = 'mangadex.org'"#), "{sql}");
        assert!(sql.contains(r#""link"."relative_reference" = ''"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert_eq!(sql.matches(" AND ").count(), 2, "{sql}");
        assert_eq!(joins.join_count(), 1);
    }

    #[test]
    fn href_pairs_are_bound_separately() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr = build_predicate(
            "hrefs",
            &vals(&[Some("a.com/x"), Some("b.com/y"), Some("c.com")]),
            &mut joins,
        )
        .unwrap();
        let (sql, values) = Query::select()
            .column((Alias::new("link"), Asterisk))
            .from_as(Alias::new("link"), Alias::new("link"))
            .and_where(expr)
            .build(PostgresQueryBuilder);
        assert_eq!(values.0.len(), 6, "{sql}");
        assert!(sql.contains("$6"), "{sql}");
    }

    #[test]
    fn existence_filter_uses_null_checks() {
        let schema = schema();

        let mut joins = JoinGraphState::new(&schema);
        let sql = render(build_predicate("used", &vals(&[Some("true")]), &mut joins).unwrap());
        assert!(sql.contains(r#""externals"."id" IS NOT NULL"#), "{sql}");
        assert!(joins.requires_group_by());

        let mut joins = JoinGraphState::new(&schema);
        let sql = render(build_predicate("used", &vals(&[Some("0")]), &mut joins).unwrap());
        assert!(sql.contains(r#""externals"."id" IS NULL"#), "{sql}");

        let mut joins = JoinGraphState::new(&schema);
        assert!(
            build_predicate("used", &vals(&[Some("yes"), Some("no")]), &mut joins).is_none()
        );
        assert!(build_predicate("used", &vals(&[Some("maybe")]), &mut joins).is_none());
        assert_eq!(joins.join_count(), 0);
    }

    #[test]
    fn prefix_filter_escapes_wildcards() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let expr = build_predicate("hostPrefix", &vals(&[Some("my_site%")]), &mut joins).unwrap();
        let (sql, values) = Query::select()
            .column((Alias::new("link"), Asterisk))
            .from_as(Alias::new("link"), Alias::new("link"))
            .and_where(expr)
            .build(PostgresQueryBuilder);
        assert!(sql.contains(r#""website"."host" LIKE $1"#), "{sql}");
        assert_eq!(values.0, vec![Value::from(r"my\_site\%%")]);
    }

    #[test]
    fn typed_values_render_as_typed_literals() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let sql = render(build_predicate("linkIds", &vals(&[Some(" 7 ")]), &mut joins).unwrap());
        assert!(sql.contains(r#""link"."id" = 7"#), "{sql}");

        let sql = render(
            build_predicate("featured", &vals(&[Some("yes"), Some("off")]), &mut joins).unwrap(),
        );
        assert!(sql.contains(r#""link"."featured" IN (TRUE, FALSE)"#), "{sql}");
    }

    #[test]
    fn unparseable_values_are_dropped() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let sql = render(
            build_predicate("linkIds", &vals(&[Some("abc"), Some("3")]), &mut joins).unwrap(),
        );
        assert!(sql.contains(r#""link"."id" = 3"#), "{sql}");
        assert!(!sql.contains("abc"), "{sql}");
    }

    #[test]
    fn only_unparseable_values_match_nothing() {
        let schema = schema();
        let mut joins = JoinGraphState::new(&schema);
        let sql = render(build_predicate("featured", &vals(&[Some("maybe")]), &mut joins).unwrap());
        assert!(sql.ends_with("WHERE FALSE"), "{sql}");
        assert_eq!(joins.join_count(), 0);

        let expr = build_predicate("linkIds", &vals(&[None, Some("x")]), &mut joins).unwrap();
        assert!(render(expr).contains(r#""link"."id" IS NULL"#));
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(escape_like_wildcards("hello"), "hello");
        assert_eq!(escape_like_wildcards("100%"), "100\\%");
        assert_eq!(escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
    }
}
