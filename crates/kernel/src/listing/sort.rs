//! Sort directive parsing.
//!
//! Clients send sort directives as free-form strings. Two shapes exist:
//!
//! - legacy: `"code desc"` (field followed by a bare direction)
//! - keyed: `"code order=desc nulls=last prefer=en+fr"`
//!
//! Parsing never fails; anything unrecognized degrades to
//! [`SortDirection::Unspecified`] / [`NullsOrder::Unspecified`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    /// Let the store default apply (ascending).
    #[default]
    Unspecified,
}

impl SortDirection {
    /// Case-insensitive lookup: `a`/`asc`/`ascending`, `d`/`desc`/`descending`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "a" | "asc" | "ascending" => SortDirection::Asc,
            "d" | "desc" | "descending" => SortDirection::Desc,
            _ => SortDirection::Unspecified,
        }
    }

    pub fn is_descending(self) -> bool {
        self == SortDirection::Desc
    }
}

/// NULL placement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NullsOrder {
    First,
    Last,
    /// No special NULL handling.
    #[default]
    Unspecified,
}

impl NullsOrder {
    /// Case-insensitive lookup: `f`/`first`, `l`/`last`.
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "f" | "first" => NullsOrder::First,
            "l" | "last" => NullsOrder::Last,
            _ => NullsOrder::Unspecified,
        }
    }
}

/// A parsed sort directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortDirective {
    /// Client-facing field name, resolved later against a schema.
    pub field: String,

    pub direction: SortDirection,

    pub nulls: NullsOrder,

    /// Unrecognized `key=value` tokens, keyed by lower-cased key.
    pub extensions: HashMap<String, String>,
}

impl SortDirective {
    /// Parse a raw directive string.
    pub fn parse(raw: &str) -> Self {
        let (field, rest) = raw.split_once(' ').unwrap_or((raw, ""));
        let mut directive = Self {
            field: field.to_string(),
            ..Default::default()
        };

        if !rest.contains('=') {
            // Legacy form: exactly "<field> <direction>".
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            if let [_, direction] = tokens.as_slice() {
                directive.direction = SortDirection::parse(direction);
            }
            return directive;
        }

        let mut remaining = rest;
        while !remaining.is_empty() {
            let (token, tail) = remaining.split_once(' ').unwrap_or((remaining, ""));
            remaining = tail;

            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let key = key.to_ascii_lowercase();
            match key.as_str() {
                "order" => directive.direction = SortDirection::parse(value),
                "nulls" => directive.nulls = NullsOrder::parse(value),
                _ => {
                    directive.extensions.insert(key, value.to_string());
                }
            }
        }

        directive
    }

    /// Build a bare `"<field> <direction>"` directive.
    pub fn bare(field: &str, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            direction,
            ..Default::default()
        }
    }

    /// Look up an extension value by (case-insensitive) key.
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl FromStr for SortDirective {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
