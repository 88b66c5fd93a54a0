//! Explicit description of a declared function's shape.
//!
//! Operations and handlers carry their signature as data: every parameter has
//! a name, a binding kind, a [`TypeHint`] standing in for the annotation and a
//! [`DefaultValue`] that is either absent, a plain value, or an explicit
//! [`ParameterSpec`] marker.

use super::spec::ParameterSpec;
use serde_json::Value;
use std::fmt;

/// A named, structured type with typed fields (a "model").
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<RecordField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub hint: TypeHint,
    pub required: bool,
}

impl RecordType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            hint,
            required: true,
        });
        self
    }

    /// Adds a field that may be absent from the input.
    #[must_use]
    pub fn optional_field(mut self, name: impl Into<String>, hint: TypeHint) -> Self {
        self.fields.push(RecordField {
            name: name.into(),
            hint,
            required: false,
        });
        self
    }
}

/// A custom named type and the names of the types it derives from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRef {
    pub name: String,
    pub ancestors: Vec<String>,
}

impl ClassRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    /// True when `self` is `other` or one of its descendants.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Self) -> bool {
        self.name == other.name || self.ancestors.iter().any(|a| *a == other.name)
    }
}

/// Annotation descriptor for a parameter or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    /// No annotation.
    Any,
    Str,
    Int,
    Float,
    Bool,
    Optional(Box<TypeHint>),
    List(Box<TypeHint>),
    /// An untyped mapping.
    Mapping,
    Record(RecordType),
    Class(ClassRef),
    Response,
    Request,
    RequestTemplate,
    Headers,
    Cookies,
    QueryParams,
    Url,
    State,
}

impl TypeHint {
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    /// Structured and mapping types are sent as request bodies by default.
    #[must_use]
    pub fn is_body_like(&self) -> bool {
        match self {
            Self::Record(_) | Self::Mapping => true,
            Self::Optional(inner) => inner.is_body_like(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Str => write!(f, "str"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Optional(inner) => write!(f, "optional<{inner}>"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Mapping => write!(f, "mapping"),
            Self::Record(record) => write!(f, "{}", record.name),
            Self::Class(class) => write!(f, "{}", class.name),
            Self::Response => write!(f, "Response"),
            Self::Request => write!(f, "Request"),
            Self::RequestTemplate => write!(f, "RequestTemplate"),
            Self::Headers => write!(f, "Headers"),
            Self::Cookies => write!(f, "Cookies"),
            Self::QueryParams => write!(f, "QueryParams"),
            Self::Url => write!(f, "Url"),
            Self::State => write!(f, "State"),
        }
    }
}

/// How a parameter binds call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParamKind {
    #[must_use]
    pub const fn is_variadic(self) -> bool {
        matches!(self, Self::VarPositional | Self::VarKeyword)
    }
}

/// Default descriptor for a parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    #[default]
    Missing,
    Value(Value),
    Spec(ParameterSpec),
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: TypeHint,
    pub default: DefaultValue,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, annotation: TypeHint) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            annotation,
            default: DefaultValue::Missing,
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = DefaultValue::Value(value);
        self
    }

    /// Attaches an explicit parameter specification.
    #[must_use]
    pub fn spec(mut self, spec: ParameterSpec) -> Self {
        self.default = DefaultValue::Spec(spec);
        self
    }

    /// The plain default value, if one was declared without a marker.
    #[must_use]
    pub const fn plain_default(&self) -> Option<&Value> {
        match &self.default {
            DefaultValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Declared return annotation, which selects how a response is decoded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReturnType {
    #[default]
    Unannotated,
    /// Explicitly returns nothing.
    Nothing,
    Response,
    Request,
    RequestTemplate,
    Record(RecordType),
    Type(TypeHint),
}

/// Ordered parameters plus the declared return type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub returns: ReturnType,
}

impl Signature {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.returns = returns;
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}
