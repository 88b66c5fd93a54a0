//! Declares the operation behind `restwire call`.

use crate::engine::Operation;
use crate::error::Error;
use crate::invocation::Arguments;
use crate::params::signature::{Param, ParamKind, ReturnType, TypeHint};
use crate::params::spec::ParameterSpec;
use reqwest::Method;
use serde_json::Value;

/// Splits `NAME=VALUE`. The value is read as JSON when it parses, otherwise
/// kept as text.
///
/// # Errors
/// Returns `InvalidArguments` when there is no `=` or the name is empty.
pub fn parse_arg(raw: &str) -> Result<(String, Value), Error> {
    let (name, value) = raw
        .split_once('=')
        .filter(|(name, _)| !name.trim().is_empty())
        .ok_or_else(|| Error::invalid_arguments(format!("expected NAME=VALUE, got '{raw}'")))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

/// Splits `NAME:VALUE`.
///
/// # Errors
/// Returns `InvalidArguments` when there is no `:` or the name is empty.
pub fn parse_header(raw: &str) -> Result<(String, String), Error> {
    raw.split_once(':')
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| Error::invalid_arguments(format!("expected NAME:VALUE, got '{raw}'")))
}

/// Annotation the argument is declared with. Objects are mappings, so
/// inference sends them as the body; everything else stays unannotated.
fn annotation_for(value: &Value) -> TypeHint {
    match value {
        Value::Object(_) => TypeHint::Mapping,
        Value::String(_) => TypeHint::Str,
        Value::Bool(_) => TypeHint::Bool,
        Value::Number(n) if n.is_i64() || n.is_u64() => TypeHint::Int,
        Value::Number(_) => TypeHint::Float,
        Value::Array(_) | Value::Null => TypeHint::Any,
    }
}

/// Declares an operation for `method` and `url` with one keyword parameter
/// per argument and one explicit header parameter per header, and returns it
/// with the arguments to call it with.
///
/// # Errors
/// Returns `InvalidArguments` for malformed input or an unknown method.
pub fn declare(
    method: &str,
    url: &str,
    raw_args: &[String],
    raw_headers: &[String],
    dry_run: bool,
) -> Result<(Operation, Arguments), Error> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .map_err(|_| Error::invalid_arguments(format!("invalid HTTP method '{method}'")))?;

    let mut builder = Operation::request(method, url).name("call");
    let mut args = Arguments::new();

    for raw in raw_args {
        let (name, value) = parse_arg(raw)?;
        builder = builder.param(
            Param::new(name.clone(), annotation_for(&value)).kind(ParamKind::KeywordOnly),
        );
        args = args.kwarg(name, value);
    }

    for (index, raw) in raw_headers.iter().enumerate() {
        let (name, value) = parse_header(raw)?;
        let param = format!("header_{index}");
        builder = builder.param(
            Param::new(param.clone(), TypeHint::Str)
                .kind(ParamKind::KeywordOnly)
                .spec(ParameterSpec::header().alias(name)),
        );
        args = args.kwarg(param, value);
    }

    if dry_run {
        builder = builder.returns(ReturnType::RequestTemplate);
    }
    Ok((builder.build()?, args))
}
