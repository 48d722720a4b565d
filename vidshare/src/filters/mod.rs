//! Filter conditions shared by every store backend.
//!
//! A [`Filter`] is a conjunction of [`FilterCondition`]s. The memory store
//! evaluates it directly against stored JSON documents; the Redis store renders
//! it as a RediSearch query.

use serde_json::Value;

use crate::search::{TAG_SEPARATOR, escape_for_tag_query, escape_for_text_contains};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Field equals the value exactly.
    Equals { field: String, value: String },
    /// Field equals one of the values. An empty list matches nothing.
    AnyOf { field: String, values: Vec<String> },
    /// Case-insensitive literal substring match.
    Contains { field: String, value: String },
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
}

impl FilterCondition {
    #[inline]
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn any_of<S: Into<String>>(field: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::AnyOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn and(conditions: impl IntoIterator<Item = FilterCondition>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    #[inline]
    pub fn or(conditions: impl IntoIterator<Item = FilterCondition>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    /// Evaluate against a stored document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::Equals { field, value } => field_text(document, field).is_some_and(|actual| actual == *value),
            Self::AnyOf { field, values } => {
                field_text(document, field).is_some_and(|actual| values.iter().any(|v| *v == actual))
            }
            Self::Contains { field, value } => field_text(document, field)
                .is_some_and(|actual| actual.to_lowercase().contains(&value.to_lowercase())),
            Self::And(conditions) => conditions.iter().all(|c| c.matches(document)),
            Self::Or(conditions) => conditions.is_empty() || conditions.iter().any(|c| c.matches(document)),
        }
    }

    /// Render as a RediSearch query clause. Empty composites render as nothing.
    pub fn to_query_clause(&self) -> String {
        match self {
            Self::Equals { field, value } => format!("(@{}:{{{}}})", field, escape_for_tag_query(value)),
            Self::AnyOf { field, values } => {
                let escaped: Vec<String> = values.iter().map(|v| escape_for_tag_query(v)).collect();
                format!("(@{}:{{{}}})", field, escaped.join(TAG_SEPARATOR))
            }
            Self::Contains { field, value } => {
                // TEXT fields are tokenized, so each word becomes its own infix term
                let terms: Vec<String> = value.split_whitespace().map(escape_for_text_contains).collect();
                match terms.len() {
                    0 => String::new(),
                    1 => format!("(@{}:{})", field, terms[0]),
                    _ => format!("(@{}:({}))", field, terms.join(" ")),
                }
            }
            Self::And(conditions) => join_clauses(conditions, " "),
            Self::Or(conditions) => join_clauses(conditions, "|"),
        }
    }

    fn is_unsatisfiable(&self) -> bool {
        match self {
            Self::AnyOf { values, .. } => values.is_empty(),
            Self::And(conditions) => conditions.iter().any(Self::is_unsatisfiable),
            Self::Or(conditions) => !conditions.is_empty() && conditions.iter().all(Self::is_unsatisfiable),
            _ => false,
        }
    }
}

fn join_clauses(conditions: &[FilterCondition], separator: &str) -> String {
    let clauses: Vec<String> = conditions
        .iter()
        .map(FilterCondition::to_query_clause)
        .filter(|s| !s.is_empty())
        .collect();
    match clauses.len() {
        0 => String::new(),
        1 => clauses.into_iter().next().unwrap_or_default(),
        _ => format!("({})", clauses.join(separator)),
    }
}

/// Scalar field rendered as text, the way a TAG index would see it.
fn field_text(document: &Value, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Conjunction of conditions. The empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<FilterCondition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with(mut self, condition: FilterCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[inline]
    pub fn with_eq(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(FilterCondition::equals(field, value))
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// True when no record can match, e.g. an any-of over zero values.
    /// Stores use this to skip the round trip entirely.
    pub fn is_unsatisfiable(&self) -> bool {
        self.conditions.iter().any(FilterCondition::is_unsatisfiable)
    }

    /// Full RediSearch query string; `*` when there is nothing to filter on.
    pub fn to_query(&self) -> String {
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .map(FilterCondition::to_query_clause)
            .filter(|s| !s.is_empty())
            .collect();
        if clauses.is_empty() {
            "*".to_string()
        } else {
            clauses.join(" ")
        }
    }
}
