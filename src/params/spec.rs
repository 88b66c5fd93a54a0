//! Parameter specifications: where a parameter lives on the wire.

use crate::constants;
use crate::di::Handler;
use crate::error::Error;
use serde_json::Value;
use std::fmt;

/// Which side's state a state parameter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateSide {
    Request,
    #[default]
    Response,
}

/// What a promise parameter receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseTarget {
    Request,
    Response,
}

/// A parameter resolved by invoking another handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub handler: Handler,
    pub use_cache: bool,
}

/// Destination of a parameter, with its destination-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Query,
    Header { convert_underscores: bool },
    Cookie,
    Path { delimiter: String },
    Body { embed: bool },
    QueryParams,
    Headers,
    Cookies,
    PathParams { delimiter: String },
    Dependency(Dependency),
    Promise(PromiseTarget),
    Url,
    StatusCode,
    Reason,
    State { side: StateSide },
    AllState { side: StateSide },
}

impl Destination {
    /// Short lowercase name used in error messages and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header { .. } => "header",
            Self::Cookie => "cookie",
            Self::Path { .. } => "path",
            Self::Body { .. } => "body",
            Self::QueryParams => "query_params",
            Self::Headers => "headers",
            Self::Cookies => "cookies",
            Self::PathParams { .. } => "path_params",
            Self::Dependency(_) => "dependency",
            Self::Promise(PromiseTarget::Request) => "request",
            Self::Promise(PromiseTarget::Response) => "response",
            Self::Url => "url",
            Self::StatusCode => "status_code",
            Self::Reason => "reason",
            Self::State { .. } => "state",
            Self::AllState { .. } => "all_state",
        }
    }

    /// Kinds that read or write a single keyed entry.
    #[must_use]
    pub const fn is_keyed(&self) -> bool {
        matches!(
            self,
            Self::Query | Self::Header { .. } | Self::Cookie | Self::Path { .. } | Self::State { .. }
        )
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared or inferred contract of one parameter.
///
/// Specs are prototypes: [`ParameterSpec::prepare`] returns a filled-in copy
/// and never touches the original, so the same spec can be attached to any
/// number of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub destination: Destination,
    pub alias: Option<String>,
    /// `None` means the parameter has no default and must be supplied.
    pub default: Option<Value>,
}

impl ParameterSpec {
    #[must_use]
    pub const fn new(destination: Destination) -> Self {
        Self {
            destination,
            alias: None,
            default: None,
        }
    }

    #[must_use]
    pub const fn query() -> Self {
        Self::new(Destination::Query)
    }

    /// Header parameter; underscores in the alias become hyphens.
    #[must_use]
    pub const fn header() -> Self {
        Self::new(Destination::Header {
            convert_underscores: true,
        })
    }

    #[must_use]
    pub const fn cookie() -> Self {
        Self::new(Destination::Cookie)
    }

    #[must_use]
    pub fn path() -> Self {
        Self::new(Destination::Path {
            delimiter: constants::DEFAULT_PATH_DELIMITER.to_string(),
        })
    }

    #[must_use]
    pub const fn body() -> Self {
        Self::new(Destination::Body { embed: false })
    }

    #[must_use]
    pub const fn query_params() -> Self {
        Self::new(Destination::QueryParams)
    }

    #[must_use]
    pub const fn headers() -> Self {
        Self::new(Destination::Headers)
    }

    #[must_use]
    pub const fn cookies() -> Self {
        Self::new(Destination::Cookies)
    }

    #[must_use]
    pub fn path_params() -> Self {
        Self::new(Destination::PathParams {
            delimiter: constants::DEFAULT_PATH_DELIMITER.to_string(),
        })
    }

    #[must_use]
    pub fn depends(handler: Handler) -> Self {
        Self::new(Destination::Dependency(Dependency {
            handler,
            use_cache: true,
        }))
    }

    #[must_use]
    pub const fn response() -> Self {
        Self::new(Destination::Promise(PromiseTarget::Response))
    }

    #[must_use]
    pub const fn request() -> Self {
        Self::new(Destination::Promise(PromiseTarget::Request))
    }

    #[must_use]
    pub const fn url() -> Self {
        Self::new(Destination::Url)
    }

    #[must_use]
    pub const fn status_code() -> Self {
        Self::new(Destination::StatusCode)
    }

    #[must_use]
    pub const fn reason() -> Self {
        Self::new(Destination::Reason)
    }

    /// Keyed state entry, read from the response state unless moved with
    /// [`ParameterSpec::side`].
    #[must_use]
    pub const fn state() -> Self {
        Self::new(Destination::State {
            side: StateSide::Response,
        })
    }

    #[must_use]
    pub const fn all_state() -> Self {
        Self::new(Destination::AllState {
            side: StateSide::Response,
        })
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Shorthand for a `null` default, which makes the parameter omittable.
    #[must_use]
    pub fn optional(self) -> Self {
        self.default(Value::Null)
    }

    /// Sets the embed flag of a body parameter. Other kinds are unchanged.
    #[must_use]
    pub fn embed(mut self, embed: bool) -> Self {
        if let Destination::Body { embed: flag } = &mut self.destination {
            *flag = embed;
        }
        self
    }

    #[must_use]
    pub fn convert_underscores(mut self, convert: bool) -> Self {
        if let Destination::Header {
            convert_underscores,
        } = &mut self.destination
        {
            *convert_underscores = convert;
        }
        self
    }

    #[must_use]
    pub fn delimiter(mut self, value: impl Into<String>) -> Self {
        if let Destination::Path { delimiter } | Destination::PathParams { delimiter } =
            &mut self.destination
        {
            *delimiter = value.into();
        }
        self
    }

    #[must_use]
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        if let Destination::Dependency(dependency) = &mut self.destination {
            dependency.use_cache = use_cache;
        }
        self
    }

    #[must_use]
    pub fn side(mut self, value: StateSide) -> Self {
        if let Destination::State { side } | Destination::AllState { side } = &mut self.destination
        {
            *side = value;
        }
        self
    }

    /// Copy of this spec with a missing alias filled from `name`.
    #[must_use]
    pub fn prepare(&self, name: &str) -> Self {
        let mut prepared = self.clone();
        if prepared.alias.is_none() {
            prepared.alias = Some(name.to_string());
        }
        prepared
    }

    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub const fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// A parameter without a default must always be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.default.is_none()
    }

    #[must_use]
    pub const fn is_body(&self) -> bool {
        matches!(self.destination, Destination::Body { .. })
    }

    /// Wire key for keyed destinations.
    ///
    /// # Errors
    /// Returns `MissingAlias` when no alias has been set or prepared.
    pub fn key(&self, parameter: &str) -> Result<String, Error> {
        let alias = self
            .alias
            .as_deref()
            .ok_or_else(|| Error::missing_alias(parameter, self.destination.name()))?;
        Ok(match self.destination {
            Destination::Header {
                convert_underscores: true,
            } => alias.replace('_', "-"),
            _ => alias.to_string(),
        })
    }
}
