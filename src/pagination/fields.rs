//! Field registry an entity exposes to the pagination service.
//!
//! Filter, search and sort names are resolved against this table, so unknown
//! names are rejected before any SQL is built and only registered columns are
//! ever interpolated into a query.

use std::cmp::Ordering;

use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use super::error::PaginationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Uuid,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Name clients use in `filters` and `sort_field`.
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
    /// Secret fields are never filtered, searched or sorted on.
    pub secret: bool,
}

impl FieldDef {
    const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column,
            kind,
            secret: false,
        }
    }

    pub const fn text(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Text)
    }

    pub const fn boolean(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Bool)
    }

    pub const fn uuid(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Uuid)
    }

    pub const fn timestamp(name: &'static str, column: &'static str) -> Self {
        Self::new(name, column, FieldKind::Timestamp)
    }

    pub const fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.kind == FieldKind::Text && !self.secret
    }
}

/// Typed scalar a filter compares against, or a row yields for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(OffsetDateTime),
}

impl FieldValue {
    /// Converts a JSON filter value into the field's kind.
    pub fn from_json(field: &FieldDef, value: &Value) -> Result<Self, PaginationError> {
        let mismatch = || {
            PaginationError::validation(format!(
                "Invalid filter value for field '{}': {}",
                field.name, value
            ))
        };
        match field.kind {
            FieldKind::Text => value
                .as_str()
                .map(|s| FieldValue::Text(s.to_string()))
                .ok_or_else(mismatch),
            FieldKind::Bool => value.as_bool().map(FieldValue::Bool).ok_or_else(mismatch),
            FieldKind::Uuid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(FieldValue::Uuid)
                .ok_or_else(mismatch),
            FieldKind::Timestamp => value
                .as_str()
                .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
                .map(FieldValue::Timestamp)
                .ok_or_else(mismatch),
        }
    }

    /// Orders two values of the same kind; values of different kinds compare equal.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// An entity the pagination service can query.
pub trait Paginated: Sized {
    const TABLE: &'static str;
    /// Field name used as the final tie-breaker when sorting.
    const KEY: &'static str;

    fn fields() -> &'static [FieldDef];

    fn field(name: &str) -> Option<&'static FieldDef> {
        Self::fields().iter().find(|f| f.name == name)
    }

    fn value_of(&self, field: &str) -> Option<FieldValue>;
}
