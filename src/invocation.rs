//! Call-site model shared by the composer, the resolver and the invoker.
//!
//! [`Arguments`] carries what the caller passed, [`BoundArguments`] is the
//! result of matching those against a [`Signature`], [`ResolvedArgs`] is what
//! a handler receives, and [`Output`] is what a call or a handler produces.

use crate::encoding;
use crate::error::Error;
use crate::params::signature::{ParamKind, Signature};
use crate::request::{Request, RequestTemplate};
use crate::response::Response;
use crate::state::State;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Positional and keyword arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Appends a positional argument encoded from any serialisable value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be encoded.
    pub fn encode_arg<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, Error> {
        Ok(self.arg(encoding::encode(value)?))
    }

    /// Adds a keyword argument encoded from any serialisable value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be encoded.
    pub fn encode_kwarg<T: Serialize + ?Sized>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, Error> {
        Ok(self.kwarg(name, encoding::encode(value)?))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// A value bound to one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Single(Value),
    VarPositional(Vec<Value>),
    VarKeyword(IndexMap<String, Value>),
}

/// Arguments matched to parameter names. Parameters the caller did not supply
/// are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    pub values: IndexMap<String, Bound>,
}

impl BoundArguments {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.values.get(name)
    }
}

impl Signature {
    /// Matches call arguments to parameters.
    ///
    /// # Errors
    /// Returns `InvalidArguments` for surplus positionals, repeated or unknown
    /// keywords, and positional-only parameters passed by keyword.
    pub fn bind(&self, args: Arguments) -> Result<BoundArguments, Error> {
        let mut bound = BoundArguments::default();
        let mut positional = args.positional.into_iter();

        for param in &self.params {
            match param.kind {
                ParamKind::PositionalOnly | ParamKind::PositionalOrKeyword => {
                    let Some(value) = positional.next() else {
                        break;
                    };
                    bound
                        .values
                        .insert(param.name.clone(), Bound::Single(value));
                }
                ParamKind::VarPositional => {
                    let rest: Vec<Value> = positional.by_ref().collect();
                    bound
                        .values
                        .insert(param.name.clone(), Bound::VarPositional(rest));
                    break;
                }
                ParamKind::KeywordOnly | ParamKind::VarKeyword => break,
            }
        }

        let surplus = positional.count();
        if surplus > 0 {
            return Err(Error::invalid_arguments(format!(
                "{surplus} unexpected positional argument(s)"
            )));
        }

        let var_keyword = self
            .params
            .iter()
            .find(|p| p.kind == ParamKind::VarKeyword)
            .map(|p| p.name.clone());

        for (name, value) in args.keyword {
            let target = self.params.iter().find(|p| {
                p.name == name
                    && matches!(
                        p.kind,
                        ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
                    )
            });

            if let Some(param) = target {
                if bound.values.contains_key(&param.name) {
                    return Err(Error::invalid_arguments(format!(
                        "multiple values for argument '{name}'"
                    )));
                }
                bound.values.insert(name, Bound::Single(value));
                continue;
            }

            let Some(var_name) = &var_keyword else {
                let positional_only = self
                    .params
                    .iter()
                    .any(|p| p.name == name && p.kind == ParamKind::PositionalOnly);
                return Err(Error::invalid_arguments(if positional_only {
                    format!("positional-only argument '{name}' passed as keyword")
                } else {
                    format!("unexpected keyword argument '{name}'")
                }));
            };

            let slot = bound
                .values
                .entry(var_name.clone())
                .or_insert_with(|| Bound::VarKeyword(IndexMap::new()));
            if let Bound::VarKeyword(map) = slot {
                map.insert(name, value);
            }
        }

        Ok(bound)
    }
}

static NULL: Value = Value::Null;

/// Result of a call or of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Nothing,
    Json(Value),
    Text(String),
    Response(Box<Response>),
    Request(Box<Request>),
    Template(Box<RequestTemplate>),
    State(State),
}

impl Output {
    /// JSON value carried by `Json`, or `Nothing` read as `null`.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Nothing => Some(&NULL),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Self::Response(response) => Some(response),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Self::Request(request) => Some(request),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_template(&self) -> Option<&RequestTemplate> {
        match self {
            Self::Template(template) => Some(template),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_state(&self) -> Option<&State> {
        match self {
            Self::State(state) => Some(state),
            _ => None,
        }
    }

    /// Renders any output as JSON for display.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Nothing => Value::Null,
            Self::Json(value) => value.clone(),
            Self::Text(text) => Value::String(text.clone()),
            Self::Response(response) => response.describe(),
            Self::Request(request) => request.describe(),
            Self::Template(template) => template.describe(),
            Self::State(state) => state.to_value(),
        }
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Arguments resolved for a handler, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArgs {
    values: IndexMap<String, Output>,
}

impl ResolvedArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Output) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Output> {
        self.values.get(name)
    }

    /// JSON argument; absent parameters read as `None`.
    #[must_use]
    pub fn json(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Output::as_json)
    }

    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Output::as_str)
    }

    #[must_use]
    pub fn response(&self, name: &str) -> Option<&Response> {
        self.get(name).and_then(Output::as_response)
    }

    #[must_use]
    pub fn request(&self, name: &str) -> Option<&Request> {
        self.get(name).and_then(Output::as_request)
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.get(name).and_then(Output::as_state)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
