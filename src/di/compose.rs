//! Writes call arguments into a request template.

use super::inference::{infer, InferenceContext};
use super::registry::DependencyRegistry;
use crate::error::{Error, Phase};
use crate::invocation::{Arguments, Bound};
use crate::params::convert;
use crate::params::signature::{Param, ParamKind, Signature};
use crate::params::spec::{Destination, ParameterSpec};
use crate::request::RequestTemplate;
use crate::utils;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// One parameter, or one spread item of a variadic parameter, ready to be
/// written.
#[derive(Debug)]
struct Entry {
    /// Declared parameter the entry came from.
    param: String,
    /// Name used in error messages.
    label: String,
    spec: ParameterSpec,
    value: Option<Value>,
    /// Later spread items add to the key instead of replacing it.
    append: bool,
}

/// Composes `args` into `template` according to `signature`.
///
/// Arguments are written to a copy of the template, which replaces the
/// original only after every entry applied and every placeholder is filled.
/// A failing call leaves `template` unchanged.
///
/// # Errors
/// - `InvalidArguments` when the arguments do not bind
/// - `UnsupportedOperation` for response-only destinations
/// - `DuplicateParameters` when two parameters share a wire key
/// - `MissingArgument` for required parameters without a value
/// - `IncompatiblePathParameters` when a placeholder is left unfilled
pub fn compose(
    signature: &Signature,
    template: &mut RequestTemplate,
    args: Arguments,
    dependencies: &DependencyRegistry,
) -> Result<(), Error> {
    let mut bound = signature.bind(args)?;
    let placeholders = template
        .url
        .as_deref()
        .map(utils::placeholders)
        .unwrap_or_default();
    let context = InferenceContext::new(&placeholders, dependencies);

    let mut entries = collect_entries(signature, &mut bound.values, &context);

    for entry in &entries {
        if !is_composable(&entry.spec.destination) {
            return Err(Error::unsupported(
                entry.spec.destination.name(),
                Phase::Composition,
            ));
        }
    }

    // More than one body parameter means each is nested under its own key
    let body_params: Vec<&str> = distinct_params(entries.iter().filter(|e| e.spec.is_body()));
    if body_params.len() > 1 {
        for entry in entries.iter_mut().filter(|e| e.spec.is_body()) {
            entry.spec = entry.spec.clone().embed(true);
        }
    }

    validate_unique(&entries)?;

    let mut ready = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(entry) = resolve_value(entry)? {
            ready.push(entry);
        }
    }

    let mut draft = template.clone();
    for (entry, value) in ready {
        apply(&mut draft, &entry.label, &entry.spec, value, entry.append)?;
    }

    let missing = draft.missing_path_params();
    if !missing.is_empty() {
        return Err(Error::incompatible_path_parameters(missing));
    }
    *template = draft;
    Ok(())
}

/// Picks the value to write for `entry`: the argument, else the declared
/// default. `None` means an optional parameter with nothing to send.
fn resolve_value(mut entry: Entry) -> Result<Option<(Entry, Value)>, Error> {
    let value = match entry.value.take() {
        Some(value) => value,
        None => entry
            .spec
            .get_default()
            .cloned()
            .ok_or_else(|| Error::missing_argument(&entry.label))?,
    };

    if value.is_null() {
        if entry.spec.is_required() {
            return Err(Error::composition(format!(
                "Parameter '{}' is required but received null",
                entry.label
            )));
        }
        trace!(target: "restwire::compose", "Omitting '{}': no value", entry.label);
        return Ok(None);
    }
    Ok(Some((entry, value)))
}

fn collect_entries(
    signature: &Signature,
    bound: &mut indexmap::IndexMap<String, Bound>,
    context: &InferenceContext<'_>,
) -> Vec<Entry> {
    let mut entries = Vec::new();
    for param in &signature.params {
        let supplied = bound.shift_remove(&param.name);
        match param.kind {
            ParamKind::VarPositional => {
                let spec = infer(param, context);
                match supplied {
                    // A variadic body is one payload holding every item
                    Some(Bound::VarPositional(values)) if spec.is_body() => {
                        if !values.is_empty() {
                            entries.push(Entry {
                                param: param.name.clone(),
                                label: param.name.clone(),
                                spec,
                                value: Some(Value::Array(values)),
                                append: false,
                            });
                        }
                    }
                    Some(Bound::VarPositional(values)) => {
                        for (index, value) in values.into_iter().enumerate() {
                            entries.push(Entry {
                                param: param.name.clone(),
                                label: format!("{}[{index}]", param.name),
                                spec: spec.clone(),
                                value: Some(value),
                                append: index > 0,
                            });
                        }
                    }
                    _ => {}
                }
            }
            ParamKind::VarKeyword => {
                if let Some(Bound::VarKeyword(pairs)) = supplied {
                    for (key, value) in pairs {
                        // Each pair is inferred as a parameter named after its key
                        let synthetic = Param {
                            name: key.clone(),
                            ..param.clone()
                        };
                        entries.push(Entry {
                            param: format!("{}.{key}", param.name),
                            label: key.clone(),
                            spec: infer(&synthetic, context),
                            value: Some(value),
                            append: false,
                        });
                    }
                }
            }
            _ => {
                let value = match supplied {
                    Some(Bound::Single(value)) => Some(value),
                    _ => None,
                };
                entries.push(Entry {
                    param: param.name.clone(),
                    label: param.name.clone(),
                    spec: infer(param, context),
                    value,
                    append: false,
                });
            }
        }
    }
    entries
}

fn distinct_params<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for entry in entries {
        if !names.contains(&entry.param.as_str()) {
            names.push(&entry.param);
        }
    }
    names
}

const fn is_composable(destination: &Destination) -> bool {
    matches!(
        destination,
        Destination::Query
            | Destination::Header { .. }
            | Destination::Cookie
            | Destination::Path { .. }
            | Destination::Body { .. }
            | Destination::QueryParams
            | Destination::Headers
            | Destination::Cookies
            | Destination::PathParams { .. }
            | Destination::State { .. }
    )
}

/// Rejects two different parameters writing the same key of the same
/// location. Spread items of one variadic parameter may share a key.
fn validate_unique(entries: &[Entry]) -> Result<(), Error> {
    let mut seen: HashMap<(&'static str, String), &str> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();

    for entry in entries {
        let category = entry.spec.destination.name();
        let key = match &entry.spec.destination {
            // Header names are case-insensitive
            Destination::Header { .. } => entry.spec.key(&entry.label)?.to_lowercase(),
            Destination::Body { embed: true }
            | Destination::Query
            | Destination::Cookie
            | Destination::Path { .. }
            | Destination::State { .. } => entry.spec.key(&entry.label)?,
            _ => continue,
        };

        match seen.get(&(category, key.clone())) {
            Some(owner) if *owner != entry.param => {
                if !duplicates.contains(&key) {
                    duplicates.push(key);
                }
            }
            Some(_) => {}
            None => {
                seen.insert((category, key), &entry.param);
            }
        }
    }

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(Error::duplicate_parameters(duplicates))
    }
}

fn apply(
    template: &mut RequestTemplate,
    label: &str,
    spec: &ParameterSpec,
    value: Value,
    append: bool,
) -> Result<(), Error> {
    debug!(
        target: "restwire::compose",
        "Composing '{}' into {}",
        label,
        spec.destination
    );

    match &spec.destination {
        Destination::Query => {
            let key = spec.key(label)?;
            if !append {
                template.params.remove(&key);
            }
            for item in convert::to_multi(&value) {
                template.params.append(key.clone(), item);
            }
        }
        Destination::Header { .. } => {
            let key = spec.key(label)?;
            let mut items = convert::to_multi(&value).into_iter();
            if !append {
                if let Some(first) = items.next() {
                    template.set_header(&key, &first)?;
                }
            }
            for item in items {
                template.append_header(&key, &item)?;
            }
        }
        Destination::Cookie => {
            let key = spec.key(label)?;
            template.set_cookie(key, convert::primitive_to_string(&value));
        }
        Destination::Path { delimiter } => {
            let key = spec.key(label)?;
            template.set_path_param(key, convert::to_path_value(&value, delimiter));
        }
        Destination::Body { embed } => {
            if *embed {
                let key = spec.key(label)?;
                template.set_json(value, Some(&key));
            } else {
                template.set_json(value, None);
            }
        }
        Destination::QueryParams => {
            let pairs = convert::to_pairs(&value, "query params")?;
            let mut replaced: Vec<&str> = Vec::new();
            for (key, _) in &pairs {
                if !replaced.contains(&key.as_str()) {
                    template.params.remove(key);
                    replaced.push(key);
                }
            }
            template.params.extend(pairs.iter().cloned());
        }
        Destination::Headers => {
            let pairs = convert::to_pairs(&value, "headers")?;
            let mut replaced: Vec<String> = Vec::new();
            for (name, item) in &pairs {
                let lower = name.to_lowercase();
                if replaced.contains(&lower) {
                    template.append_header(name, item)?;
                } else {
                    template.set_header(name, item)?;
                    replaced.push(lower);
                }
            }
        }
        Destination::Cookies => {
            for (name, item) in convert::to_pairs(&value, "cookies")? {
                template.set_cookie(name, item);
            }
        }
        Destination::PathParams { delimiter } => {
            template
                .path_params
                .extend(convert::to_path_params(&value, delimiter)?);
        }
        Destination::State { .. } => {
            let key = spec.key(label)?;
            template.state.insert(key, value);
        }
        other => return Err(Error::unsupported(other.name(), Phase::Composition)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::registry::Profile;
    use crate::di::Handler;
    use crate::invocation::Output;
    use crate::params::signature::{RecordType, TypeHint};
    use crate::request::Body;
    use reqwest::Method;
    use serde_json::json;

    fn run(
        signature: &Signature,
        url: &str,
        args: Arguments,
    ) -> Result<RequestTemplate, Error> {
        let mut template = RequestTemplate::new(Method::GET, url);
        let registry = DependencyRegistry::with_builtins(Profile::Request);
        compose(signature, &mut template, args, &registry)?;
        Ok(template)
    }

    #[test]
    fn test_placeholder_name_becomes_path() {
        let sig = Signature::new().param(Param::new("id", TypeHint::Str));
        let template = run(&sig, "/items/{id}", Arguments::new().kwarg("id", "42")).unwrap();
        assert!(template.params.is_empty());
        assert_eq!(template.build().unwrap().url, "/items/42");
    }

    #[test]
    fn test_int_path_value() {
        let sig = Signature::new().param(Param::new("code", TypeHint::Int));
        let template = run(&sig, "/status/{code}", Arguments::new().arg(204)).unwrap();
        let request = template.build().unwrap();
        assert_eq!(request.url, "/status/204");
        assert!(request.body.is_none());
    }

    #[test]
    fn test_duplicate_aliases_rejected_before_mutation() {
        let sig = Signature::new()
            .param(Param::new("a", TypeHint::Str).spec(ParameterSpec::query().alias("name")))
            .param(Param::new("b", TypeHint::Str).spec(ParameterSpec::query().alias("name")));
        let mut template = RequestTemplate::new(Method::GET, "/users");
        let before = template.clone();
        let err = compose(
            &sig,
            &mut template,
            Arguments::new().arg("x").arg("y"),
            &DependencyRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameters { ref aliases } if aliases == &["name"]));
        assert_eq!(template, before);
    }

    #[test]
    fn test_same_alias_in_different_locations_is_allowed() {
        let sig = Signature::new()
            .param(Param::new("a", TypeHint::Str).spec(ParameterSpec::query().alias("id")))
            .param(Param::new("b", TypeHint::Str).spec(ParameterSpec::header().alias("id")));
        let template = run(&sig, "/", Arguments::new().arg("1").arg("2")).unwrap();
        assert_eq!(template.params.get("id"), Some("1"));
        assert_eq!(template.header("id"), Some("2"));
    }

    #[test]
    fn test_header_duplicates_are_case_insensitive() {
        let sig = Signature::new()
            .param(Param::new("a", TypeHint::Str).spec(ParameterSpec::header().alias("X-Id")))
            .param(Param::new("x_id", TypeHint::Str).spec(ParameterSpec::header()));
        let err = run(&sig, "/", Arguments::new().arg("1").arg("2")).unwrap_err();
        assert!(matches!(err, Error::DuplicateParameters { .. }));
    }

    #[test]
    fn test_missing_and_omitted_query() {
        let required = Signature::new().param(Param::new("q", TypeHint::Str));
        let err = run(&required, "/search", Arguments::new()).unwrap_err();
        assert!(matches!(err, Error::MissingArgument { ref parameter } if parameter == "q"));

        let optional = Signature::new().param(
            Param::new("q", TypeHint::optional(TypeHint::Str)).default_value(Value::Null),
        );
        let template = run(&optional, "/search", Arguments::new()).unwrap();
        assert!(template.params.is_empty());
        assert_eq!(template.build().unwrap().url, "/search");
    }

    #[test]
    fn test_required_null_is_rejected() {
        let sig = Signature::new().param(Param::new("q", TypeHint::Str));
        let err = run(&sig, "/", Arguments::new().arg(Value::Null)).unwrap_err();
        assert!(matches!(err, Error::Composition(_)));
    }

    #[test]
    fn test_single_body_is_root_unless_embedded() {
        let item = TypeHint::Record(RecordType::new("Item"));
        let sig = Signature::new().param(Param::new("item", item.clone()));
        let template = run(&sig, "/items", Arguments::new().arg(json!({"name": "lamp"}))).unwrap();
        assert_eq!(template.json(), Some(&json!({"name": "lamp"})));

        let embedded = Signature::new()
            .param(Param::new("item", item).spec(ParameterSpec::body().embed(true)));
        let template =
            run(&embedded, "/items", Arguments::new().arg(json!({"name": "lamp"}))).unwrap();
        assert_eq!(template.json(), Some(&json!({"item": {"name": "lamp"}})));
    }

    #[test]
    fn test_multiple_bodies_are_always_embedded() {
        let sig = Signature::new()
            .param(Param::new("item", TypeHint::Mapping).spec(ParameterSpec::body().embed(false)))
            .param(Param::new("user", TypeHint::Record(RecordType::new("User"))));
        let template = run(
            &sig,
            "/items",
            Arguments::new()
                .arg(json!({"name": "lamp"}))
                .arg(json!({"id": 1})),
        )
        .unwrap();
        assert_eq!(
            template.json(),
            Some(&json!({"item": {"name": "lamp"}, "user": {"id": 1}}))
        );
    }

    #[test]
    fn test_unfilled_placeholder() {
        let sig = Signature::new().param(Param::new("q", TypeHint::Str));
        let err = run(&sig, "/users/{user}", Arguments::new().arg("x")).unwrap_err();
        assert!(
            matches!(err, Error::IncompatiblePathParameters { ref missing } if missing == &["user"])
        );
    }

    #[test]
    fn test_response_only_destinations_are_rejected() {
        let sig = Signature::new()
            .param(Param::new("code", TypeHint::Int).spec(ParameterSpec::status_code()));
        let err = run(&sig, "/", Arguments::new().arg(200)).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedOperation {
                destination: "status_code",
                phase: Phase::Composition
            }
        ));

        let headers = Signature::new().param(Param::new("headers", TypeHint::Headers));
        let err = run(&headers, "/", Arguments::new().arg(json!({}))).unwrap_err();
        assert_eq!(err.to_json().error_type, "Composition");

        let handler = Handler::new("dep", Signature::new(), |_| Ok(Output::Nothing));
        let dep = Signature::new()
            .param(Param::new("d", TypeHint::Any).spec(ParameterSpec::depends(handler)));
        assert!(run(&dep, "/", Arguments::new()).is_err());
    }

    #[test]
    fn test_sequences_and_bulk_locations() {
        let sig = Signature::new()
            .param(Param::new("tag", TypeHint::list(TypeHint::Str)))
            .param(Param::new("x_trace", TypeHint::Str).spec(ParameterSpec::header()))
            .param(Param::new("session", TypeHint::Str).spec(ParameterSpec::cookie()))
            .param(Param::new("path", TypeHint::Any).spec(ParameterSpec::path().delimiter("/")))
            .param(Param::new("extra", TypeHint::QueryParams).spec(ParameterSpec::query_params()))
            .param(Param::new("meta", TypeHint::Any).spec(ParameterSpec::state()));
        let template = run(
            &sig,
            "/files/{path}",
            Arguments::new()
                .arg(json!(["a", "b"]))
                .arg("abc")
                .arg("s1")
                .arg(json!(["docs", "guide.md"]))
                .arg(json!({"page": 2}))
                .arg(json!({"attempt": 1})),
        )
        .unwrap();

        assert_eq!(template.params.get_all("tag"), vec!["a", "b"]);
        assert_eq!(template.params.get("page"), Some("2"));
        assert_eq!(template.header("x-trace"), Some("abc"));
        assert_eq!(template.cookies.get("session").map(String::as_str), Some("s1"));
        assert_eq!(template.state.get("meta"), Some(&json!({"attempt": 1})));
        assert_eq!(
            template.build().unwrap().url,
            "/files/docs/guide.md?tag=a&tag=b&page=2"
        );
    }

    #[test]
    fn test_variadics_spread() {
        let sig = Signature::new()
            .param(Param::new("ids", TypeHint::Int).kind(ParamKind::VarPositional))
            .param(Param::new("filters", TypeHint::Str).kind(ParamKind::VarKeyword));
        let template = run(
            &sig,
            "/items/{kind}",
            Arguments::new()
                .arg(1)
                .arg(2)
                .kwarg("kind", "tools")
                .kwarg("color", "red"),
        )
        .unwrap();
        assert_eq!(template.params.get_all("ids"), vec!["1", "2"]);
        assert_eq!(template.params.get("color"), Some("red"));
        assert_eq!(template.path_params.get("kind").map(String::as_str), Some("tools"));
    }

    #[test]
    fn test_variadic_body_sends_every_item() {
        let sig = Signature::new()
            .param(Param::new("items", TypeHint::Mapping).kind(ParamKind::VarPositional));
        let template = run(
            &sig,
            "/batch",
            Arguments::new().arg(json!({"a": 1})).arg(json!({"b": 2})),
        )
        .unwrap();
        assert_eq!(
            template.body,
            Some(Body::Json(json!([{"a": 1}, {"b": 2}])))
        );

        let empty = run(&sig, "/batch", Arguments::new()).unwrap();
        assert!(empty.body.is_none());
    }

    #[test]
    fn test_variadic_body_is_embedded_next_to_another_body() {
        let sig = Signature::new()
            .param(Param::new("owner", TypeHint::Mapping))
            .param(Param::new("items", TypeHint::Mapping).kind(ParamKind::VarPositional));
        let template = run(
            &sig,
            "/batch",
            Arguments::new()
                .arg(json!({"id": 7}))
                .arg(json!({"a": 1}))
                .arg(json!({"b": 2})),
        )
        .unwrap();
        assert_eq!(
            template.body,
            Some(Body::Json(json!({
                "owner": {"id": 7},
                "items": [{"a": 1}, {"b": 2}]
            })))
        );
    }

    #[test]
    fn test_failed_compose_leaves_template_untouched() {
        let sig = Signature::new()
            .param(Param::new("page", TypeHint::Int).spec(ParameterSpec::query()))
            .param(Param::new("user", TypeHint::Str).spec(ParameterSpec::header()));
        let mut template = RequestTemplate::new(Method::GET, "/users");
        let before = template.clone();
        let err = compose(
            &sig,
            &mut template,
            Arguments::new().kwarg("page", 2),
            &DependencyRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingArgument { .. }));
        assert!(template.params.is_empty());
        assert_eq!(template, before);

        let err = compose(
            &sig,
            &mut template,
            Arguments::new().kwarg("page", 2).kwarg("user", Value::Null),
            &DependencyRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Composition(_)));
        assert_eq!(template, before);
    }

    #[test]
    fn test_unfilled_placeholder_leaves_template_untouched() {
        let sig = Signature::new()
            .param(Param::new("page", TypeHint::Int).spec(ParameterSpec::query()));
        let mut template = RequestTemplate::new(Method::GET, "/items/{id}");
        let err = compose(
            &sig,
            &mut template,
            Arguments::new().arg(3),
            &DependencyRegistry::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::IncompatiblePathParameters { .. }));
        assert!(template.params.is_empty());
    }

    #[test]
    fn test_path_sequence_keeps_custom_delimiter() {
        let sig = Signature::new()
            .param(Param::new("ids", TypeHint::Any).spec(ParameterSpec::path().delimiter(",")));
        let template = run(&sig, "/items/{ids}", Arguments::new().arg(json!([1, 2, 3]))).unwrap();
        assert_eq!(template.build().unwrap().url, "/items/1,2,3");
    }

    #[test]
    fn test_explicit_body_raw_string() {
        let sig = Signature::new()
            .param(Param::new("payload", TypeHint::Str).spec(ParameterSpec::body()));
        let template = run(&sig, "/", Arguments::new().arg("hi")).unwrap();
        assert_eq!(template.body, Some(Body::Json(json!("hi"))));
    }
}
