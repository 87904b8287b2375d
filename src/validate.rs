//! Explicit per-entity validation. Constraints live in the schema metadata
//! and are checked here before any persistence, returning a structured list
//! of violations instead of relying on store-side schema magic.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::{ColumnType, Schema};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Violation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Validate record attributes against a schema. On `Mode::Create` every
/// required column must be present; on `Mode::Update` only the supplied
/// attributes are checked. Attributes that name no writable column are
/// ignored, the way the original store layer dropped unknown fields.
pub fn validate(schema: &Schema, attrs: &Map<String, Value>, mode: Mode) -> Vec<Violation> {
    let mut violations = Vec::new();

    if mode == Mode::Create {
        for col in schema
            .columns
            .iter()
            .filter(|c| c.required && c.writable)
        {
            match attrs.get(col.name) {
                None | Some(Value::Null) => {
                    violations.push(Violation::new(col.name, "is required"));
                }
                _ => {}
            }
        }
    }

    for (key, value) in attrs {
        if value.is_null() {
            continue;
        }
        let Some(col) = schema.column(key).filter(|c| c.writable) else {
            continue;
        };
        if let Some(v) = check_type(col.name, col.ty, col.positive, value) {
            violations.push(v);
        }
    }

    if schema.has_credentials {
        violations.extend(validate_credentials(attrs, mode));
    }

    violations
}

fn check_type(
    field: &str,
    ty: ColumnType,
    positive: bool,
    value: &Value,
) -> Option<Violation> {
    match ty {
        ColumnType::Text => match value {
            Value::String(_) => None,
            _ => Some(Violation::new(field, "must be a string")),
        },
        ColumnType::Email => match value {
            Value::String(s) if is_valid_email(s) => None,
            Value::String(_) => Some(Violation::new(field, "must be a valid email address")),
            _ => Some(Violation::new(field, "must be a string")),
        },
        ColumnType::Numeric => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            match parsed {
                // "NaN" and "inf" parse as f64 but are not storable amounts.
                Some(n) if !n.is_finite() => Some(Violation::new(field, "must be a number")),
                Some(n) if positive && n <= 0.0 => {
                    Some(Violation::new(field, "must be a positive number"))
                }
                Some(_) => None,
                None => Some(Violation::new(field, "must be a number")),
            }
        }
        ColumnType::Uuid => match value {
            Value::String(s) if Uuid::try_parse(s).is_ok() => None,
            _ => Some(Violation::new(field, "must be a valid id")),
        },
        ColumnType::Timestamp => match value {
            Value::String(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => None,
            _ => Some(Violation::new(field, "must be an RFC 3339 timestamp")),
        },
    }
}

fn validate_credentials(attrs: &Map<String, Value>, mode: Mode) -> Vec<Violation> {
    let mut violations = Vec::new();

    let password = attrs.get("password").and_then(Value::as_str);
    let confirm = attrs.get("password_confirm").and_then(Value::as_str);

    match (password, mode) {
        (None, Mode::Create) => {
            violations.push(Violation::new("password", "is required"));
        }
        (Some(p), _) => {
            if p.len() < MIN_PASSWORD_LEN {
                violations.push(Violation::new(
                    "password",
                    format!("must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
            if confirm != Some(p) {
                violations.push(Violation::new("password_confirm", "Passwords do not match"));
            }
        }
        (None, Mode::Update) => {}
    }

    violations
}
