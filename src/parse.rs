//! Type-directed parsing of wire values.
//!
//! The engine never interprets a [`TypeHint`] itself; it hands the raw value
//! and the declared hint to a [`ValueParser`] and surfaces any
//! [`ValidationError`] unchanged.

use crate::params::signature::{RecordType, TypeHint};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A value did not match the type it was declared as.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation failed at '{path}': expected {expected}, found {found}")]
pub struct ValidationError {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, expected: impl Into<String>, found: &Value) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            found: describe(found),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}

/// Collaborator that turns raw values into values of a declared type.
pub trait ValueParser: Send + Sync {
    /// Parses an already-decoded value as `hint`.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] when the value cannot be read as `hint`.
    fn parse(&self, hint: &TypeHint, raw: Value) -> Result<Value, ValidationError>;

    /// Parses response text as `hint`, reading it as JSON first and falling
    /// back to the text itself.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] when neither reading matches `hint`.
    fn parse_text(&self, hint: &TypeHint, text: &str) -> Result<Value, ValidationError> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.parse(hint, value),
            Err(_) => self.parse(hint, Value::String(text.to_string())),
        }
    }
}

/// Lenient parser: coerces strings and numbers the way query strings and
/// headers need, validates records field by field.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoercingParser;

impl ValueParser for CoercingParser {
    fn parse(&self, hint: &TypeHint, raw: Value) -> Result<Value, ValidationError> {
        parse_at("$", hint, raw)
    }
}

fn parse_at(path: &str, hint: &TypeHint, raw: Value) -> Result<Value, ValidationError> {
    match hint {
        TypeHint::Optional(inner) => {
            if raw.is_null() {
                Ok(Value::Null)
            } else {
                parse_at(path, inner, raw)
            }
        }
        TypeHint::Str | TypeHint::Url => parse_str(path, hint, raw),
        TypeHint::Int => parse_int(path, raw),
        TypeHint::Float => parse_float(path, raw),
        TypeHint::Bool => parse_bool(path, raw),
        TypeHint::List(inner) => match raw {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| parse_at(&format!("{path}[{i}]"), inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Err(ValidationError::new(path, hint.to_string(), &other)),
        },
        TypeHint::Mapping
        | TypeHint::Headers
        | TypeHint::Cookies
        | TypeHint::QueryParams
        | TypeHint::State => match raw {
            Value::Object(_) => Ok(raw),
            other => Err(ValidationError::new(path, hint.to_string(), &other)),
        },
        TypeHint::Record(record) => parse_record(path, record, raw),
        TypeHint::Any
        | TypeHint::Class(_)
        | TypeHint::Response
        | TypeHint::Request
        | TypeHint::RequestTemplate => Ok(raw),
    }
}

fn parse_str(path: &str, hint: &TypeHint, raw: Value) -> Result<Value, ValidationError> {
    match raw {
        Value::String(_) => Ok(raw),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(ValidationError::new(path, hint.to_string(), &other)),
    }
}

fn parse_int(path: &str, raw: Value) -> Result<Value, ValidationError> {
    let parsed = match &raw {
        Value::Number(n) if n.is_i64() || n.is_u64() => return Ok(raw),
        #[allow(clippy::cast_possible_truncation)]
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| Value::from(f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::new(path, "int", &raw))
}

fn parse_float(path: &str, raw: Value) -> Result<Value, ValidationError> {
    let parsed = match &raw {
        Value::Number(_) => return Ok(raw),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::new(path, "float", &raw))
}

fn parse_bool(path: &str, raw: Value) -> Result<Value, ValidationError> {
    let parsed = match &raw {
        Value::Bool(_) => return Ok(raw),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(Value::Bool)
        .ok_or_else(|| ValidationError::new(path, "bool", &raw))
}

fn parse_record(path: &str, record: &RecordType, raw: Value) -> Result<Value, ValidationError> {
    let Value::Object(mut object) = raw else {
        return Err(ValidationError::new(path, record.name.clone(), &raw));
    };

    // A record without declared fields is opaque
    if record.fields.is_empty() {
        return Ok(Value::Object(object));
    }

    let mut parsed = Map::new();
    for field in &record.fields {
        let field_path = format!("{path}.{}", field.name);
        match object.remove(&field.name) {
            Some(value) => {
                parsed.insert(field.name.clone(), parse_at(&field_path, &field.hint, value)?);
            }
            None if field.required => {
                return Err(ValidationError {
                    path: field_path,
                    expected: field.hint.to_string(),
                    found: "missing field".to_string(),
                });
            }
            None => {}
        }
    }
    Ok(Value::Object(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerces_query_strings() {
        let parser = CoercingParser;
        assert_eq!(parser.parse(&TypeHint::Int, json!("42")).unwrap(), json!(42));
        assert_eq!(parser.parse(&TypeHint::Float, json!("1.5")).unwrap(), json!(1.5));
        assert_eq!(parser.parse(&TypeHint::Bool, json!("off")).unwrap(), json!(false));
        assert_eq!(parser.parse(&TypeHint::Str, json!(7)).unwrap(), json!("7"));
    }

    #[test]
    fn test_optional_accepts_null() {
        let parser = CoercingParser;
        let hint = TypeHint::optional(TypeHint::Int);
        assert_eq!(parser.parse(&hint, Value::Null).unwrap(), Value::Null);
        assert!(parser.parse(&TypeHint::Int, Value::Null).is_err());
    }

    #[test]
    fn test_record_validation_reports_path() {
        let record = RecordType::new("User")
            .field("id", TypeHint::Int)
            .optional_field("email", TypeHint::Str);
        let hint = TypeHint::Record(record);
        let parser = CoercingParser;

        let ok = parser
            .parse(&hint, json!({"id": "3", "extra": true}))
            .unwrap();
        assert_eq!(ok, json!({"id": 3}));

        let err = parser.parse(&hint, json!({"id": "x"})).unwrap_err();
        assert_eq!(err.path, "$.id");
        assert_eq!(err.expected, "int");

        let missing = parser.parse(&hint, json!({})).unwrap_err();
        assert_eq!(missing.found, "missing field");
    }

    #[test]
    fn test_parse_text_falls_back_to_raw_string() {
        let parser = CoercingParser;
        assert_eq!(parser.parse_text(&TypeHint::Str, "hello").unwrap(), json!("hello"));
        assert_eq!(parser.parse_text(&TypeHint::Int, "204").unwrap(), json!(204));
        assert!(parser.parse_text(&TypeHint::Int, "abc").is_err());
    }

    #[test]
    fn test_list_items_are_parsed() {
        let parser = CoercingParser;
        let hint = TypeHint::list(TypeHint::Int);
        assert_eq!(parser.parse(&hint, json!(["1", 2])).unwrap(), json!([1, 2]));
        let err = parser.parse(&hint, json!([1, "b"])).unwrap_err();
        assert_eq!(err.path, "$[1]");
    }
}
