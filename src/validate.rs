//! Presence and type checks for inbound JSON payloads.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    String,
}

impl JsonType {
    pub fn name(self) -> &'static str {
        match self {
            JsonType::String => "string",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
        }
    }
}

fn runtime_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub kind: JsonType,
}

impl FieldRule {
    pub const fn required(field: &'static str, kind: JsonType) -> Self {
        Self {
            field,
            required: true,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Expected a JSON object.")]
    NotAnObject,
    #[error("Missing required data: {}.", .0.join(", "))]
    Missing(Vec<String>),
    #[error("{}", describe_mismatches(.0))]
    WrongType(Vec<TypeMismatch>),
}

fn describe_mismatches(mismatches: &[TypeMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| {
            format!(
                "Invalid type for key {}: Expected type {}, got {}.",
                m.field, m.expected, m.found
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub const REGISTER_RULES: &[FieldRule] = &[
    FieldRule::required("name", JsonType::String),
    FieldRule::required("surname", JsonType::String),
    FieldRule::required("email", JsonType::String),
    FieldRule::required("password", JsonType::String),
];

pub const LOGIN_RULES: &[FieldRule] = &[
    FieldRule::required("email", JsonType::String),
    FieldRule::required("password", JsonType::String),
];

pub const CHANGE_PASSWORD_RULES: &[FieldRule] = &[
    FieldRule::required("old_password", JsonType::String),
    FieldRule::required("new_password", JsonType::String),
];

pub const ADMIN_CHANGE_PASSWORD_RULES: &[FieldRule] =
    &[FieldRule::required("new_password", JsonType::String)];

/// Runs the required-field pass, then the type pass. Every failure in a pass is reported at once.
pub fn validate_data(data: &Value, rules: &[FieldRule]) -> Result<(), ValidationError> {
    let Some(fields) = data.as_object() else {
        return Err(ValidationError::NotAnObject);
    };

    let missing: Vec<String> = rules
        .iter()
        .filter(|rule| rule.required)
        .filter(|rule| fields.get(rule.field).map_or(true, Value::is_null))
        .map(|rule| rule.field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::Missing(missing));
    }

    let mismatches: Vec<TypeMismatch> = fields
        .iter()
        .filter_map(|(key, value)| {
            let rule = rules.iter().find(|r| r.field == key)?;
            if rule.kind.matches(value) {
                None
            } else {
                Some(TypeMismatch {
                    field: key.clone(),
                    expected: rule.kind.name(),
                    found: runtime_type(value),
                })
            }
        })
        .collect();
    if !mismatches.is_empty() {
        return Err(ValidationError::WrongType(mismatches));
    }

    Ok(())
}
