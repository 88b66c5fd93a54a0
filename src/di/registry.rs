use super::Handler;
use crate::error::Error;
use crate::invocation::Output;
use crate::params::signature::{Param, Signature, TypeHint};
use crate::params::spec::ParameterSpec;
use crate::request::QueryParams;
use crate::response::Response;
use indexmap::IndexMap;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

/// Which side of a call a registry serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Request,
    Response,
}

/// Types that are produced by a handler rather than read from the wire.
#[derive(Debug, Clone, Default)]
pub struct DependencyRegistry {
    entries: Vec<(TypeHint, Handler)>,
}

impl DependencyRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry pre-populated with the built-in types of `profile`.
    #[must_use]
    pub fn with_builtins(profile: Profile) -> Self {
        let mut registry = Self::new();
        match profile {
            Profile::Request => {
                for hint in [
                    TypeHint::Headers,
                    TypeHint::QueryParams,
                    TypeHint::Cookies,
                    TypeHint::Url,
                    TypeHint::State,
                ] {
                    registry.register(hint.clone(), pre_request(hint));
                }
            }
            Profile::Response => {
                registry.register(TypeHint::Response, from_response("response", |r| {
                    Output::Response(Box::new(r.clone()))
                }));
                registry.register(TypeHint::Request, from_response("request", |r| {
                    Output::Request(Box::new(r.request.clone()))
                }));
                registry.register(TypeHint::Headers, from_response("response_headers", |r| {
                    Output::Json(headers_to_value(&r.headers))
                }));
                registry.register(TypeHint::Cookies, from_response("response_cookies", |r| {
                    Output::Json(map_to_value(&r.cookies()))
                }));
                registry.register(TypeHint::QueryParams, from_response("params", |r| {
                    Output::Json(query_to_value(&r.request.query()))
                }));
                registry.register(TypeHint::Url, from_response("url", |r| {
                    Output::Json(Value::String(r.request.url.clone()))
                }));
                registry.register(TypeHint::State, from_response("response_state", |r| {
                    Output::State(r.state.clone())
                }));
            }
        }
        registry
    }

    /// Registers `handler` as the producer of `hint`, replacing any earlier
    /// registration for the same type.
    pub fn register(&mut self, hint: TypeHint, handler: Handler) {
        if let Some(entry) = self.entries.iter_mut().find(|(h, _)| *h == hint) {
            entry.1 = handler;
        } else {
            self.entries.push((hint, handler));
        }
    }

    /// Finds the producer for an annotation.
    ///
    /// Class annotations also match registered subclasses.
    #[must_use]
    pub fn lookup(&self, annotation: &TypeHint) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|(registered, _)| match (registered, annotation) {
                (TypeHint::Class(registered), TypeHint::Class(wanted)) => {
                    registered.is_subclass_of(wanted)
                }
                (registered, wanted) => registered == wanted,
            })
            .map(|(_, handler)| handler)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn from_response<F>(name: &str, read: F) -> Handler
where
    F: Fn(&Response) -> Output + Send + Sync + 'static,
{
    let signature = Signature::new().param(
        Param::new("response", TypeHint::Response).spec(ParameterSpec::response()),
    );
    Handler::new(name, signature, move |args| {
        args.response("response").map(&read).ok_or_else(|| {
            Error::resolution("built-in dependency received no response")
        })
    })
}

// Request-side built-ins exist so that these annotations are recognised as
// dependencies; dependencies cannot be composed into a request.
fn pre_request(hint: TypeHint) -> Handler {
    let name = format!("pre_request_{}", hint.to_string().to_lowercase());
    let signature = Signature::new().param(
        Param::new("request", TypeHint::RequestTemplate).spec(ParameterSpec::request()),
    );
    Handler::new(name, signature, move |args| {
        args.request("request").map_or_else(
            || {
                Err(Error::resolution(format!(
                    "{hint} is only available before the request is sent"
                )))
            },
            |request| {
                Ok(match &hint {
                    TypeHint::Headers => Output::Json(headers_to_value(&request.headers)),
                    TypeHint::QueryParams => Output::Json(query_to_value(&request.query())),
                    TypeHint::Cookies => Output::Json(map_to_value(&request.cookies())),
                    TypeHint::State => Output::State(request.state.clone()),
                    _ => Output::Json(Value::String(request.url.clone())),
                })
            },
        )
    })
}

/// Headers as a JSON object; repeated headers are comma-joined.
#[must_use]
pub fn headers_to_value(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(joined));
    }
    Value::Object(map)
}

/// Query params as a JSON object; repeated keys become arrays.
#[must_use]
pub fn query_to_value(params: &QueryParams) -> Value {
    let mut map = Map::new();
    for key in params.keys() {
        let values = params.get_all(key);
        let value = if values.len() == 1 {
            Value::String(values[0].to_string())
        } else {
            Value::Array(values.into_iter().map(|v| Value::String(v.to_string())).collect())
        };
        map.insert(key.to_string(), value);
    }
    Value::Object(map)
}

#[must_use]
pub fn map_to_value(map: &IndexMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::ResolvedArgs;
    use crate::params::signature::ClassRef;
    use serde_json::json;

    fn constant(value: Value) -> Handler {
        Handler::new("constant", Signature::new(), move |_| Ok(Output::Json(value.clone())))
    }

    #[test]
    fn test_builtins_per_profile() {
        let response = DependencyRegistry::with_builtins(Profile::Response);
        assert_eq!(response.len(), 7);
        assert!(response.lookup(&TypeHint::Response).is_some());

        let request = DependencyRegistry::with_builtins(Profile::Request);
        assert_eq!(request.len(), 5);
        assert!(request.lookup(&TypeHint::Response).is_none());
        assert!(request.lookup(&TypeHint::Headers).is_some());
    }

    #[test]
    fn test_lookup_matches_registered_subclass() {
        let mut registry = DependencyRegistry::new();
        let session = ClassRef::new("AdminSession").extends("Session");
        registry.register(TypeHint::Class(session), constant(json!("admin")));

        let wanted = TypeHint::Class(ClassRef::new("Session"));
        let handler = registry.lookup(&wanted).unwrap();
        assert_eq!(
            handler.call(&ResolvedArgs::new()).unwrap(),
            Output::Json(json!("admin"))
        );
        assert!(registry
            .lookup(&TypeHint::Class(ClassRef::new("Other")))
            .is_none());
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut registry = DependencyRegistry::new();
        registry.register(TypeHint::Str, constant(json!(1)));
        registry.register(TypeHint::Str, constant(json!(2)));
        assert_eq!(registry.len(), 1);
        let out = registry
            .lookup(&TypeHint::Str)
            .unwrap()
            .call(&ResolvedArgs::new())
            .unwrap();
        assert_eq!(out, Output::Json(json!(2)));
    }

    #[test]
    fn test_query_to_value_groups_repeats() {
        let params: QueryParams = [("a", "1"), ("a", "2"), ("b", "x")].into_iter().collect();
        assert_eq!(query_to_value(&params), json!({"a": ["1", "2"], "b": "x"}));
    }
}
