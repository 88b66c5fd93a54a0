//! Invokes handlers with arguments extracted from a response.

use super::inference::{infer, is_inferable, InferenceContext};
use super::registry::{headers_to_value, map_to_value, query_to_value, DependencyRegistry};
use super::{Handler, HandlerId};
use crate::error::Error;
use crate::invocation::{Output, ResolvedArgs};
use crate::params::signature::{Param, Signature, TypeHint};
use crate::params::spec::{Dependency, Destination, ParameterSpec, PromiseTarget, StateSide};
use crate::parse::ValueParser;
use crate::response::Response;
use crate::state::State;
use crate::utils;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Per-call resolution state: memoised dependency outputs and the chain of
/// handlers currently being resolved.
#[derive(Debug, Default)]
pub struct ResolutionScope {
    cache: HashMap<HandlerId, Output>,
    chain: Vec<(HandlerId, String)>,
}

impl ResolutionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoised dependency outputs.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn enter(&mut self, handler: &Handler) -> Result<(), Error> {
        let id = handler.id();
        if self.chain.iter().any(|(seen, _)| *seen == id) {
            let mut names: Vec<&str> = self.chain.iter().map(|(_, name)| name.as_str()).collect();
            names.push(handler.name());
            return Err(Error::resolution(format!(
                "Dependency cycle detected: {}",
                names.join(" -> ")
            )));
        }
        self.chain.push((id, handler.name().to_string()));
        Ok(())
    }

    fn leave(&mut self) {
        self.chain.pop();
    }
}

/// Resolves handler parameters against a response.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    dependencies: &'a DependencyRegistry,
    parser: &'a dyn ValueParser,
    template_url: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(dependencies: &'a DependencyRegistry, parser: &'a dyn ValueParser) -> Self {
        Self {
            dependencies,
            parser,
            template_url: None,
        }
    }

    /// URL template the response's request was rendered from. Path
    /// parameters are recovered by matching it against the sent URL.
    #[must_use]
    pub const fn template_url(mut self, template_url: &'a str) -> Self {
        self.template_url = Some(template_url);
        self
    }

    /// Resolves and invokes `handler` in a fresh scope.
    ///
    /// # Errors
    /// Returns `Resolution` for parameters that cannot be resolved or for
    /// dependency cycles, `Validation` when a value does not parse as its
    /// annotation, and whatever the handler itself returns.
    pub fn resolve(&self, handler: &Handler, response: &Response) -> Result<Output, Error> {
        let mut scope = ResolutionScope::new();
        self.resolve_in(handler, response, &mut scope)
    }

    /// Resolves and invokes `handler`, sharing memoised dependencies with
    /// everything else resolved in `scope`.
    ///
    /// # Errors
    /// See [`Resolver::resolve`].
    pub fn resolve_in(
        &self,
        handler: &Handler,
        response: &Response,
        scope: &mut ResolutionScope,
    ) -> Result<Output, Error> {
        scope.enter(handler)?;
        let result = self
            .resolve_args(handler.signature(), response, scope)
            .and_then(|args| {
                debug!(
                    target: "restwire::resolve",
                    "Calling handler '{}' with {} argument(s)",
                    handler.name(),
                    args.len()
                );
                handler.call(&args)
            });
        scope.leave();
        result
    }

    fn resolve_args(
        &self,
        signature: &Signature,
        response: &Response,
        scope: &mut ResolutionScope,
    ) -> Result<ResolvedArgs, Error> {
        let (placeholders, path_values) = self.template_url.map_or_else(
            || (Vec::new(), IndexMap::new()),
            |template| {
                (
                    utils::placeholders(template),
                    utils::extract_path_params(template, &response.request.url),
                )
            },
        );
        let context = InferenceContext::new(&placeholders, self.dependencies);

        let mut args = ResolvedArgs::new();
        for param in &signature.params {
            // Variadic slots have nothing to receive from a response
            if param.kind.is_variadic() {
                continue;
            }
            if !is_inferable(param, &context) {
                return Err(Error::resolution(format!(
                    "Cannot determine how to resolve parameter '{}'",
                    param.name
                )));
            }
            let spec = infer(param, &context);
            let value = self.resolve_param(param, &spec, response, &path_values, scope)?;
            args.insert(param.name.clone(), value);
        }
        Ok(args)
    }

    fn resolve_param(
        &self,
        param: &Param,
        spec: &ParameterSpec,
        response: &Response,
        path_values: &IndexMap<String, String>,
        scope: &mut ResolutionScope,
    ) -> Result<Output, Error> {
        trace!(
            target: "restwire::resolve",
            "Resolving '{}' from {}",
            param.name,
            spec.destination
        );

        let output = match &spec.destination {
            Destination::Query => {
                let query = response.request.query();
                let key = spec.key(&param.name)?;
                Output::Json(text_values(&query.get_all(&key), &param.annotation))
            }
            Destination::Header { .. } => {
                let key = spec.key(&param.name)?;
                let values: Vec<&str> = response
                    .headers
                    .get_all(key.as_str())
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .collect();
                Output::Json(text_values(&values, &param.annotation))
            }
            Destination::Cookie => {
                let key = spec.key(&param.name)?;
                Output::Json(
                    response
                        .cookies()
                        .get(&key)
                        .map_or(Value::Null, |v| Value::String(v.clone())),
                )
            }
            Destination::Path { .. } => {
                let key = spec.key(&param.name)?;
                Output::Json(
                    path_values
                        .get(&key)
                        .map_or(Value::Null, |v| Value::String(v.clone())),
                )
            }
            Destination::Body { .. } => {
                if param.annotation.is_any() {
                    Output::Json(response.json()?)
                } else {
                    Output::Json(self.parser.parse_text(&param.annotation, &response.text())?)
                }
            }
            Destination::QueryParams => Output::Json(query_to_value(&response.request.query())),
            Destination::Headers => Output::Json(headers_to_value(&response.headers)),
            Destination::Cookies => Output::Json(map_to_value(&response.cookies())),
            Destination::PathParams { .. } => Output::Json(map_to_value(path_values)),
            Destination::Dependency(dependency) => {
                return self.resolve_dependency(dependency, response, scope);
            }
            Destination::Promise(PromiseTarget::Response) => {
                return Ok(Output::Response(Box::new(response.clone())));
            }
            Destination::Promise(PromiseTarget::Request) => {
                return Ok(Output::Request(Box::new(response.request.clone())));
            }
            Destination::Url => Output::Json(Value::String(response.request.url.clone())),
            Destination::StatusCode => Output::Json(Value::from(response.status.as_u16())),
            Destination::Reason => Output::Json(Value::String(response.reason.clone())),
            Destination::State { side } => {
                let key = spec.key(&param.name)?;
                Output::Json(state_of(response, *side).get(&key).unwrap_or(Value::Null))
            }
            Destination::AllState { side } => {
                return Ok(Output::State(state_of(response, *side).clone()));
            }
        };

        match output {
            Output::Json(Value::Null) => Ok(Output::Json(
                spec.get_default().cloned().unwrap_or(Value::Null),
            )),
            Output::Json(value) if !spec.is_body() && !param.annotation.is_any() => {
                Ok(Output::Json(self.parser.parse(&param.annotation, value)?))
            }
            other => Ok(other),
        }
    }

    fn resolve_dependency(
        &self,
        dependency: &Dependency,
        response: &Response,
        scope: &mut ResolutionScope,
    ) -> Result<Output, Error> {
        let id = dependency.handler.id();
        if dependency.use_cache {
            if let Some(cached) = scope.cache.get(&id) {
                trace!(
                    target: "restwire::resolve",
                    "Reusing cached dependency '{}'",
                    dependency.handler.name()
                );
                return Ok(cached.clone());
            }
        }

        let output = self.resolve_in(&dependency.handler, response, scope)?;
        if dependency.use_cache {
            scope.cache.insert(id, output.clone());
        }
        Ok(output)
    }
}

const fn state_of(response: &Response, side: StateSide) -> &State {
    match side {
        StateSide::Request => &response.request.state,
        StateSide::Response => &response.state,
    }
}

fn wants_list(hint: &TypeHint) -> bool {
    match hint {
        TypeHint::List(_) => true,
        TypeHint::Optional(inner) => wants_list(inner),
        _ => false,
    }
}

/// Repeated wire values: all of them for list annotations, otherwise the
/// first one.
fn text_values(values: &[&str], hint: &TypeHint) -> Value {
    match values.first() {
        None => Value::Null,
        Some(_) if wants_list(hint) => Value::Array(
            values.iter().map(|v| Value::String((*v).to_string())).collect(),
        ),
        Some(first) => Value::String((*first).to_string()),
    }
}
