//! Listing schema descriptors.
//!
//! A [`SchemaDescriptor`] declares, for one listing:
//! - the root table and its alias
//! - relations reachable from the root (always LEFT joined)
//! - client-facing field names mapped to `(alias, column)`
//! - named criteria and how their values become predicates
//! - the default ordering and the sort-directive cap
//!
//! Descriptors are validated once, when built. A descriptor that references
//! an undeclared alias or field fails construction instead of producing a
//! broken query at request time.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::criteria::{ColumnType, ValueKind};
use super::sort::SortDirection;

/// Default cap on honored sort directives.
pub const DEFAULT_MAX_SORT_DIRECTIVES: usize = 8;

/// Descriptor construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("listing '{listing}': alias '{alias}' is declared twice")]
    DuplicateAlias { listing: String, alias: String },

    #[error("listing '{listing}': alias '{alias}' is referenced before it is declared")]
    UnknownAlias { listing: String, alias: String },

    #[error("listing '{listing}': field '{field}' is declared twice")]
    DuplicateField { listing: String, field: String },

    #[error("listing '{listing}': field '{field}' is not declared")]
    UnknownField { listing: String, field: String },

    #[error("listing '{listing}': criterion '{criterion}' is declared twice")]
    DuplicateCriterion { listing: String, criterion: String },

    #[error("listing '{listing}': prefix criterion '{criterion}' reads a non-text field")]
    NonTextPrefix { listing: String, criterion: String },

    #[error("listing '{listing}': sort directive cap must be at least 1")]
    InvalidSortCap { listing: String },
}

/// A joinable relation.
///
/// Joined as `LEFT JOIN table AS alias ON parent.parent_column = alias.column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub alias: String,
    pub parent: String,
    pub table: String,
    pub parent_column: String,
    pub column: String,
    /// One-to-many: joining multiplies root rows.
    pub fan_out: bool,
}

/// A client-facing field resolved to a concrete column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub alias: String,
    pub column: String,
    pub column_type: ColumnType,
}

/// How a criterion's values become a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionKind {
    /// `field = v` / `field IN (...)`.
    Equals(String),
    /// Like [`CriterionKind::Equals`] with the null/empty-string sentinel swap.
    RelativeReference(String),
    /// Values are hrefs matched against a `(host, relative reference)` pair.
    Href { host: String, reference: String },
    /// Truthy value: `field IS NOT NULL`; falsy: `field IS NULL`.
    Exists(String),
    /// Literal string-prefix match.
    Prefix(String),
}

impl CriterionKind {
    /// Fields the criterion reads.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            CriterionKind::Equals(f)
            | CriterionKind::RelativeReference(f)
            | CriterionKind::Exists(f)
            | CriterionKind::Prefix(f) => vec![f.as_str()],
            CriterionKind::Href { host, reference } => vec![host.as_str(), reference.as_str()],
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            CriterionKind::RelativeReference(_) => ValueKind::RelativeReference,
            _ => ValueKind::Plain,
        }
    }
}

/// Immutable per-listing schema.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    name: String,
    root_table: String,
    root_alias: String,
    primary_key: String,
    relations: HashMap<String, Relation>,
    fields: HashMap<String, FieldRef>,
    field_order: Vec<String>,
    preferable: HashSet<String>,
    criteria: Vec<(String, CriterionKind)>,
    default_order: Vec<(String, SortDirection)>,
    max_sort_directives: usize,
    cacheable: bool,
}

impl SchemaDescriptor {
    /// Start a descriptor rooted at `table AS alias` with primary key `id`.
    pub fn builder(name: &str, table: &str, alias: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            root_table: table.to_string(),
            root_alias: alias.to_string(),
            primary_key: "id".to_string(),
            relations: Vec::new(),
            fields: Vec::new(),
            preferable: Vec::new(),
            criteria: Vec::new(),
            default_order: Vec::new(),
            max_sort_directives: DEFAULT_MAX_SORT_DIRECTIVES,
            cacheable: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_table(&self) -> &str {
        &self.root_table
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn relation(&self, alias: &str) -> Option<&Relation> {
        self.relations.get(alias)
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn field(&self, name: &str) -> Option<&FieldRef> {
        self.fields.get(name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_order.iter().map(String::as_str)
    }

    /// Whether the field accepts the `prefer` sort extension.
    pub fn is_preferable(&self, field: &str) -> bool {
        self.preferable.contains(field)
    }

    pub fn criterion(&self, name: &str) -> Option<&CriterionKind> {
        self.criteria
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| kind)
    }

    /// Criteria in declaration order.
    pub fn criteria(&self) -> impl Iterator<Item = (&str, &CriterionKind)> {
        self.criteria.iter().map(|(n, k)| (n.as_str(), k))
    }

    pub fn default_order(&self) -> &[(String, SortDirection)] {
        &self.default_order
    }

    pub fn max_sort_directives(&self) -> usize {
        self.max_sort_directives
    }

    /// Whether results may be served from the query result cache.
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }
}

/// Builder for [`SchemaDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    root_table: String,
    root_alias: String,
    primary_key: String,
    relations: Vec<Relation>,
    fields: Vec<(String, FieldRef)>,
    preferable: Vec<String>,
    criteria: Vec<(String, CriterionKind)>,
    default_order: Vec<(String, SortDirection)>,
    max_sort_directives: usize,
    cacheable: bool,
}

impl SchemaBuilder {
    pub fn primary_key(mut self, column: &str) -> Self {
        self.primary_key = column.to_string();
        self
    }

    /// Declare a many-to-one (or one-to-one) relation.
    ///
    /// `on` is `(parent_column, column)`.
    pub fn join(self, alias: &str, parent: &str, table: &str, on: (&str, &str)) -> Self {
        self.relation(alias, parent, table, on, false)
    }

    /// Declare a one-to-many relation. Joining it groups the query by the
    /// root primary key.
    pub fn join_many(self, alias: &str, parent: &str, table: &str, on: (&str, &str)) -> Self {
        self.relation(alias, parent, table, on, true)
    }

    fn relation(
        mut self,
        alias: &str,
        parent: &str,
        table: &str,
        (parent_column, column): (&str, &str),
        fan_out: bool,
    ) -> Self {
        self.relations.push(Relation {
            alias: alias.to_string(),
            parent: parent.to_string(),
            table: table.to_string(),
            parent_column: parent_column.to_string(),
            column: column.to_string(),
            fan_out,
        });
        self
    }

    /// Declare a text field.
    pub fn field(self, name: &str, alias: &str, column: &str) -> Self {
        self.typed_field(name, alias, column, ColumnType::Text)
    }

    /// Declare a field whose criterion values must parse as `column_type`.
    pub fn typed_field(
        mut self,
        name: &str,
        alias: &str,
        column: &str,
        column_type: ColumnType,
    ) -> Self {
        self.fields.push((
            name.to_string(),
            FieldRef {
                alias: alias.to_string(),
                column: column.to_string(),
                column_type,
            },
        ));
        self
    }

    /// Allow the `prefer` extension on a field.
    pub fn preferable(mut self, field: &str) -> Self {
        self.preferable.push(field.to_string());
        self
    }

    pub fn criterion(mut self, name: &str, kind: CriterionKind) -> Self {
        self.criteria.push((name.to_string(), kind));
        self
    }

    pub fn default_order(mut self, field: &str, direction: SortDirection) -> Self {
        self.default_order.push((field.to_string(), direction));
        self
    }

    pub fn max_sort_directives(mut self, cap: usize) -> Self {
        self.max_sort_directives = cap;
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    /// Validate and freeze the descriptor.
    pub fn build(self) -> Result<SchemaDescriptor, SchemaError> {
        let listing = self.name.clone();
        let unknown_alias = |alias: &str| SchemaError::UnknownAlias {
            listing: listing.clone(),
            alias: alias.to_string(),
        };
        let unknown_field = |field: &str| SchemaError::UnknownField {
            listing: listing.clone(),
            field: field.to_string(),
        };

        if self.max_sort_directives == 0 {
            return Err(SchemaError::InvalidSortCap {
                listing: self.name.clone(),
            });
        }

        // Parents must be declared before children, which also rules out cycles.
        let mut aliases: HashSet<&str> = HashSet::from([self.root_alias.as_str()]);
        let mut relations = HashMap::with_capacity(self.relations.len());
        for relation in &self.relations {
            if !aliases.contains(relation.parent.as_str()) {
                return Err(unknown_alias(&relation.parent));
            }
            if !aliases.insert(relation.alias.as_str()) {
                return Err(SchemaError::DuplicateAlias {
                    listing: self.name.clone(),
                    alias: relation.alias.clone(),
                });
            }
            relations.insert(relation.alias.clone(), relation.clone());
        }

        let mut fields = HashMap::with_capacity(self.fields.len());
        let mut field_order = Vec::with_capacity(self.fields.len());
        for (name, field) in &self.fields {
            if !aliases.contains(field.alias.as_str()) {
                return Err(unknown_alias(&field.alias));
            }
            if fields.insert(name.clone(), field.clone()).is_some() {
                return Err(SchemaError::DuplicateField {
                    listing: self.name.clone(),
                    field: name.clone(),
                });
            }
            field_order.push(name.clone());
        }

        for name in &self.preferable {
            if !fields.contains_key(name) {
                return Err(unknown_field(name));
            }
        }

        let mut criterion_names = HashSet::new();
        for (name, kind) in &self.criteria {
            if !criterion_names.insert(name.as_str()) {
                return Err(SchemaError::DuplicateCriterion {
                    listing: self.name.clone(),
                    criterion: name.clone(),
                });
            }
            if let Some(missing) = kind.fields().into_iter().find(|f| !fields.contains_key(*f)) {
                return Err(unknown_field(missing));
            }
            if let CriterionKind::Prefix(field) = kind
                && fields.get(field).is_some_and(|f| f.column_type != ColumnType::Text)
            {
                return Err(SchemaError::NonTextPrefix {
                    listing: self.name.clone(),
                    criterion: name.clone(),
                });
            }
        }

        for (name, _) in &self.default_order {
            if !fields.contains_key(name) {
                return Err(unknown_field(name));
            }
        }

        Ok(SchemaDescriptor {
            name: self.name,
            root_table: self.root_table,
            root_alias: self.root_alias,
            primary_key: self.primary_key,
            relations,
            fields,
            field_order,
            preferable: self.preferable.into_iter().collect(),
            criteria: self.criteria,
            default_order: self.default_order,
            max_sort_directives: self.max_sort_directives,
            cacheable: self.cacheable,
        })
    }
}
