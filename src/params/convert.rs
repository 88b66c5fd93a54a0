//! Conversion of argument values into wire strings.

use crate::error::Error;
use indexmap::IndexMap;
use serde_json::Value;

/// Renders a scalar the way it appears in a URL or header.
///
/// Strings are used verbatim, `null` becomes the empty string and nested
/// structures fall back to compact JSON.
#[must_use]
pub fn primitive_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Values for a repeatable location (query or header): one entry per item of
/// a sequence, a single entry otherwise.
#[must_use]
pub fn to_multi(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(primitive_to_string).collect(),
        other => vec![primitive_to_string(other)],
    }
}

/// Value for a path placeholder. Sequences are joined with `delimiter`.
#[must_use]
pub fn to_path_value(value: &Value, delimiter: &str) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(primitive_to_string)
            .collect::<Vec<_>>()
            .join(delimiter),
        other => primitive_to_string(other),
    }
}

/// Reads a bulk argument as ordered `(key, value)` pairs.
///
/// Accepts an object, whose array values expand into repeated keys, or a
/// sequence of two-element `[key, value]` arrays.
///
/// # Errors
/// Returns a composition error naming `what` for any other shape.
pub fn to_pairs(value: &Value, what: &str) -> Result<Vec<(String, String)>, Error> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .flat_map(|(key, value)| {
                to_multi(value)
                    .into_iter()
                    .map(move |item| (key.clone(), item))
            })
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(pair) if pair.len() == 2 => Ok((
                    primitive_to_string(&pair[0]),
                    primitive_to_string(&pair[1]),
                )),
                _ => Err(Error::composition(format!(
                    "{what} entries must be [key, value] pairs, got {item}"
                ))),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::composition(format!(
            "{what} must be a mapping or a sequence of pairs, got {other}"
        ))),
    }
}

/// Reads a bulk path-params argument, joining sequence values with
/// `delimiter`.
///
/// # Errors
/// Returns a composition error unless the argument is an object.
pub fn to_path_params(value: &Value, delimiter: &str) -> Result<IndexMap<String, String>, Error> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), to_path_value(value, delimiter)))
            .collect()),
        Value::Null => Ok(IndexMap::new()),
        other => Err(Error::composition(format!(
            "path params must be a mapping, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_rendering() {
        assert_eq!(primitive_to_string(&json!("x")), "x");
        assert_eq!(primitive_to_string(&json!(true)), "true");
        assert_eq!(primitive_to_string(&json!(2.5)), "2.5");
        assert_eq!(primitive_to_string(&Value::Null), "");
    }

    #[test]
    fn test_sequences_expand_or_join() {
        assert_eq!(to_multi(&json!(["a", 1])), vec!["a", "1"]);
        assert_eq!(to_multi(&json!(7)), vec!["7"]);
        assert_eq!(to_path_value(&json!(["2024", "01"]), "-"), "2024-01");
    }

    #[test]
    fn test_pairs_from_object_and_sequence() {
        assert_eq!(
            to_pairs(&json!({"tag": ["a", "b"], "page": 1}), "query params").unwrap(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string()),
            ]
        );
        assert_eq!(
            to_pairs(&json!([["x", 1]]), "headers").unwrap(),
            vec![("x".to_string(), "1".to_string())]
        );
        assert!(to_pairs(&json!("nope"), "cookies").is_err());
        assert!(to_pairs(&json!([["only-key"]]), "cookies").is_err());
    }

    #[test]
    fn test_path_params_join_with_delimiter() {
        let params = to_path_params(&json!({"date": [2024, 5], "id": "x"}), ".").unwrap();
        assert_eq!(params["date"], "2024.5");
        assert_eq!(params["id"], "x");
    }
}
