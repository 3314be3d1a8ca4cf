//! Criteria value normalization.

use std::collections::{HashMap, HashSet};

/// Filter name → raw values. `None` is the client's null sentinel.
pub type Criteria = HashMap<String, Vec<Option<String>>>;

/// How raw values of a criterion are interpreted before deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Plain,
    /// Values of a relative-reference column: the stored default is `""`
    /// while clients may send null for "no path", so `None` and `""` swap.
    RelativeReference,
}

/// Storage type of a filtered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Text,
    Integer,
    Boolean,
}

impl ColumnType {
    /// Canonical literal for `raw`, or `None` when it cannot be a value of
    /// this type.
    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        match self {
            ColumnType::Text => Some(raw.to_string()),
            ColumnType::Integer => raw.trim().parse::<i64>().ok().map(|n| n.to_string()),
            ColumnType::Boolean => parse_flag(raw).map(|flag| flag.to_string()),
        }
    }
}

/// Lenient boolean: `1/true/yes/y/on` and `0/false/no/n/off`, any case.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Deduplicated criterion values in first-seen order.
///
/// Values that cannot be stored in the filtered column are dropped and
/// counted; such a value can never match a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniqueValues {
    values: Vec<Option<String>>,
    rejected: usize,
}

/// Predicate shape chosen for a set of unique values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// No values: the criterion contributes no predicate.
    Skip,
    /// Exactly one value: equality (or `IS NULL`).
    Equal(Option<&'a str>),
    /// Several values: membership.
    In(&'a [Option<String>]),
}

impl UniqueValues {
    /// Normalize raw values for a criterion of the given kind over a column
    /// of the given type.
    pub fn normalize(raw: &[Option<String>], kind: ValueKind, column_type: ColumnType) -> Self {
        let mut seen = HashSet::with_capacity(raw.len());
        let mut values = Vec::with_capacity(raw.len());
        let mut rejected = 0;

        for value in raw {
            let value = match kind {
                ValueKind::Plain => value.clone(),
                ValueKind::RelativeReference => match value.as_deref() {
                    None => Some(String::new()),
                    Some("") => None,
                    Some(other) => Some(other.to_string()),
                },
            };
            let value = match value {
                Some(raw) => match column_type.canonicalize(&raw) {
                    Some(canonical) => Some(canonical),
                    None => {
                        rejected += 1;
                        continue;
                    }
                },
                None => None,
            };
            if seen.insert(value.clone()) {
                values.push(value);
            }
        }

        Self { values, rejected }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of raw values dropped for not fitting the column type.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        &self.values
    }

    /// Non-null values only.
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.values.iter().flatten().map(String::as_str)
    }

    pub fn contains_null(&self) -> bool {
        self.values.iter().any(Option::is_none)
    }

    pub fn selection(&self) -> Selection<'_> {
        match self.values.as_slice() {
            [] => Selection::Skip,
            [single] => Selection::Equal(single.as_deref()),
            many => Selection::In(many),
        }
    }
}
