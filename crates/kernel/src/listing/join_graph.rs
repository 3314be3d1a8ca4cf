//! Per-query join bookkeeping.
//!
//! A [`JoinGraphState`] lives for one query-building call. Criteria and sort
//! terms ask for the aliases they need; each relation on the path from the
//! root is attached at most once, always as a LEFT join, so a filter or sort
//! on a related field never drops rows whose relation is absent.

use std::collections::HashSet;

use sea_query::{Alias, Expr, JoinType, SelectStatement};

use super::schema::{FieldRef, Relation, SchemaDescriptor, SchemaError};

/// Joins attached to one query under construction.
#[derive(Debug, Clone)]
pub struct JoinGraphState<'s> {
    schema: &'s SchemaDescriptor,
    attached: HashSet<&'s str>,
    joins: Vec<&'s Relation>,
    group_by_root: bool,
}

impl<'s> JoinGraphState<'s> {
    pub fn new(schema: &'s SchemaDescriptor) -> Self {
        Self {
            schema,
            attached: HashSet::new(),
            joins: Vec::new(),
            group_by_root: false,
        }
    }

    pub fn schema(&self) -> &'s SchemaDescriptor {
        self.schema
    }

    /// Attach every relation between the root and `alias`, returning the
    /// alias to reference. Repeated calls are no-ops.
    pub fn ensure_join(&mut self, alias: &str) -> Result<&'s str, SchemaError> {
        let schema = self.schema;
        let unknown = |alias: &str| SchemaError::UnknownAlias {
            listing: schema.name().to_string(),
            alias: alias.to_string(),
        };

        let root = schema.root_alias();
        if alias == root {
            return Ok(root);
        }
        let target = schema.relation(alias).ok_or_else(|| unknown(alias))?;

        let mut chain = Vec::new();
        let mut current = target;
        while !self.attached.contains(current.alias.as_str()) {
            chain.push(current);
            if current.parent == root {
                break;
            }
            current = schema
                .relation(&current.parent)
                .ok_or_else(|| unknown(&current.parent))?;
        }

        for relation in chain.into_iter().rev() {
            self.attached.insert(relation.alias.as_str());
            self.joins.push(relation);
            if relation.fan_out {
                self.ensure_group_by_root();
            }
        }

        Ok(target.alias.as_str())
    }

    /// Ensure the joins a field needs and return its column expression.
    pub fn ensure_field(&mut self, field: &FieldRef) -> Result<Expr, SchemaError> {
        let alias = self.ensure_join(&field.alias)?;
        Ok(column(alias, &field.column))
    }

    /// Request `GROUP BY root.pk`. Idempotent.
    pub fn ensure_group_by_root(&mut self) {
        self.group_by_root = true;
    }

    pub fn requires_group_by(&self) -> bool {
        self.group_by_root
    }

    pub fn is_attached(&self, alias: &str) -> bool {
        alias == self.schema.root_alias() || self.attached.contains(alias)
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }

    /// Attached aliases in join order.
    pub fn aliases(&self) -> impl Iterator<Item = &'s str> + '_ {
        self.joins.iter().map(|r| r.alias.as_str())
    }

    /// Add the attached joins to `query`.
    pub fn apply_joins(&self, query: &mut SelectStatement) {
        for relation in &self.joins {
            query.join_as(
                JoinType::LeftJoin,
                Alias::new(&relation.table),
                Alias::new(&relation.alias),
                Expr::col((Alias::new(&relation.parent), Alias::new(&relation.parent_column)))
                    .equals((Alias::new(&relation.alias), Alias::new(&relation.column))),
            );
        }
    }

    /// Add `GROUP BY root.pk` when a fan-out join was attached.
    pub fn apply_group_by(&self, query: &mut SelectStatement) {
        if self.group_by_root {
            query.group_by_col((
                Alias::new(self.schema.root_alias()),
                Alias::new(self.schema.primary_key()),
            ));
        }
    }
}

/// `alias.column` expression.
pub(crate) fn column(alias: &str, column: &str) -> Expr {
    Expr::col((Alias::new(alias), Alias::new(column)))
}
