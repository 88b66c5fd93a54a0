use crate::constants;
use crate::parse::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The two directions a parameter specification can be driven in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Writing call arguments into an outgoing request.
    Composition,
    /// Reading handler arguments back out of a response.
    Resolution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composition => write!(f, "composition"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Transport error: {reason}")]
    Transport { reason: String },
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Parameter '{parameter}' ({destination}) is missing a required alias")]
    MissingAlias {
        parameter: String,
        destination: &'static str,
    },
    #[error("Duplicate parameters: {}", aliases.join(", "))]
    DuplicateParameters { aliases: Vec<String> },
    #[error("Invalid parameter specification: {0}")]
    InvalidParameterSpecification(String),
    #[error("Failed to prepare parameter '{parameter}': {reason}")]
    Preparation { parameter: String, reason: String },
    #[error("Missing argument for parameter '{parameter}': no default and no value provided")]
    MissingArgument { parameter: String },
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Incompatible path params. Missing: {}", missing.join(", "))]
    IncompatiblePathParameters { missing: Vec<String> },
    #[error("Composition error: {0}")]
    Composition(String),
    #[error("Resolution error: {0}")]
    Resolution(String),
    #[error("Unsupported operation: {destination} parameters do not support {phase}")]
    UnsupportedOperation {
        destination: &'static str,
        phase: Phase,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// JSON representation of an error for structured output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: String,
    pub message: String,
    pub context: Option<String>,
}

impl Error {
    pub fn missing_alias(parameter: impl Into<String>, destination: &'static str) -> Self {
        Self::MissingAlias {
            parameter: parameter.into(),
            destination,
        }
    }

    pub fn duplicate_parameters<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::DuplicateParameters {
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn missing_argument(parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            parameter: parameter.into(),
        }
    }

    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments(reason.into())
    }

    pub fn incompatible_path_parameters<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::IncompatiblePathParameters {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    pub fn composition(reason: impl Into<String>) -> Self {
        Self::Composition(reason.into())
    }

    pub fn resolution(reason: impl Into<String>) -> Self {
        Self::Resolution(reason.into())
    }

    pub fn preparation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Preparation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn unsupported(destination: &'static str, phase: Phase) -> Self {
        Self::UnsupportedOperation { destination, phase }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_header(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// True for the errors raised while checking an operation's parameter
    /// contract, all of which abort a call before anything is sent.
    #[must_use]
    pub const fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingAlias { .. }
                | Self::DuplicateParameters { .. }
                | Self::InvalidParameterSpecification(_)
                | Self::Preparation { .. }
        )
    }

    /// Add context to an error for better user messaging
    #[must_use]
    pub fn with_context(self, context: &str) -> Self {
        match self {
            Self::Network(e) => Self::Transport {
                reason: format!("{context}: {e}"),
            },
            Self::Io(e) => Self::Config(format!("{context}: {e}")),
            _ => self,
        }
    }

    /// Convert error to JSON representation for structured output
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, context) = match self {
            Self::Config(_) => ("Configuration", None),
            Self::Io(io_err) => {
                let context = match io_err.kind() {
                    std::io::ErrorKind::NotFound => Some(constants::ERR_FILE_NOT_FOUND),
                    std::io::ErrorKind::PermissionDenied => Some(constants::ERR_PERMISSION),
                    _ => None,
                };
                ("FileSystem", context)
            }
            Self::Network(req_err) => {
                let context = if req_err.is_connect() {
                    Some(constants::ERR_CONNECTION)
                } else if req_err.is_timeout() {
                    Some(constants::ERR_TIMEOUT)
                } else {
                    None
                };
                ("Network", context)
            }
            Self::Transport { .. } => ("Transport", Some(constants::ERR_CONNECTION)),
            Self::Yaml(_) => ("YAMLParsing", None),
            Self::Json(_) => ("JSONParsing", Some(constants::ERR_JSON_SYNTAX)),
            Self::Toml(_) => ("TOMLParsing", Some(constants::ERR_TOML_SYNTAX)),
            Self::MissingAlias { .. }
            | Self::DuplicateParameters { .. }
            | Self::InvalidParameterSpecification(_)
            | Self::Preparation { .. } => ("Declaration", Some(constants::ERR_DECLARATION)),
            Self::MissingArgument { .. } | Self::InvalidArguments(_) => {
                ("Arguments", Some(constants::ERR_ARGUMENTS))
            }
            Self::IncompatiblePathParameters { .. } => {
                ("IncompatiblePathParameters", Some(constants::ERR_PATH_PARAMS))
            }
            Self::Composition(_)
            | Self::UnsupportedOperation {
                phase: Phase::Composition,
                ..
            } => ("Composition", Some(constants::ERR_DECLARATION)),
            Self::Resolution(_)
            | Self::UnsupportedOperation {
                phase: Phase::Resolution,
                ..
            } => ("Resolution", Some(constants::ERR_DECLARATION)),
            Self::Validation(_) => ("Validation", None),
            Self::InvalidUrl { .. } => ("InvalidUrl", None),
            Self::InvalidHeader { .. } => ("InvalidHeader", None),
            Self::Anyhow(_) => ("Handler", Some(constants::ERR_HANDLER)),
        };

        JsonError {
            error_type: error_type.to_string(),
            message: self.to_string(),
            context: context.map(str::to_string),
        }
    }
}
