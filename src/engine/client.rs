//! The client: transport plus everything shared by the operations it calls.

use super::middleware::{BoxFuture, Middleware, Next};
use super::transport::{ReqwestTransport, Transport};
use crate::config::models::ClientConfig;
use crate::di::{DependencyRegistry, Handler, Profile};
use crate::error::Error;
use crate::params::signature::TypeHint;
use crate::parse::{CoercingParser, ValueParser};
use crate::request::{Request, RequestTemplate};
use crate::response::Response;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Calls [`Operation`](super::Operation)s through a [`Transport`].
///
/// The client owns the default request every call starts from, a fallback
/// response handler, the middleware wrapped around every send, the
/// dependency registries of both sides and the value parser.
pub struct Client<T: Transport = ReqwestTransport> {
    pub(crate) transport: T,
    pub(crate) base_url: Option<String>,
    pub(crate) defaults: RequestTemplate,
    pub(crate) default_response: Option<Handler>,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) request_dependencies: DependencyRegistry,
    pub(crate) response_dependencies: DependencyRegistry,
    pub(crate) parser: Arc<dyn ValueParser>,
}

impl Client<ReqwestTransport> {
    /// Client over a fresh reqwest transport configured from `config`.
    ///
    /// # Errors
    /// Returns an error if the transport cannot be created or the
    /// configuration renders an invalid default request.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let transport =
            ReqwestTransport::with_timeout(Duration::from_secs(config.default_timeout_secs))?;
        Self::from_config_with(config, transport)
    }
}

impl<T: Transport> Client<T> {
    pub fn builder(transport: T) -> ClientBuilder<T> {
        ClientBuilder::new(transport)
    }

    /// Client over `transport` configured from `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration renders an invalid default
    /// request.
    pub fn from_config_with(config: &ClientConfig, transport: T) -> Result<Self, Error> {
        let mut builder = ClientBuilder::new(transport).defaults(config.to_template()?);
        if let Some(base_url) = &config.base_url {
            builder = builder.base_url(base_url.clone());
        }
        Ok(builder.build())
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub const fn defaults(&self) -> &RequestTemplate {
        &self.defaults
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers a response-side dependency type.
    pub fn register_dependency(&mut self, hint: TypeHint, handler: Handler) {
        self.response_dependencies.register(hint, handler);
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("defaults", &self.defaults)
            .field("default_response", &self.default_response)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// Builds a [`Client`].
#[must_use]
pub struct ClientBuilder<T: Transport> {
    transport: T,
    base_url: Option<String>,
    defaults: RequestTemplate,
    default_response: Option<Handler>,
    middleware: Vec<Middleware>,
    request_dependencies: DependencyRegistry,
    response_dependencies: DependencyRegistry,
    parser: Arc<dyn ValueParser>,
}

impl<T: Transport> ClientBuilder<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: None,
            defaults: RequestTemplate::default(),
            default_response: None,
            middleware: Vec::new(),
            request_dependencies: DependencyRegistry::with_builtins(Profile::Request),
            response_dependencies: DependencyRegistry::with_builtins(Profile::Response),
            parser: Arc::new(CoercingParser),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Request every call starts from. Its URL, if any, is ignored in favour
    /// of the base URL.
    pub fn defaults(mut self, defaults: RequestTemplate) -> Self {
        self.defaults = RequestTemplate {
            url: None,
            ..defaults
        };
        self
    }

    /// Adds a default header.
    ///
    /// # Errors
    /// Returns an error for an invalid header name or value.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        self.defaults.set_header(name, value)?;
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.params.append(key, value);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.set_cookie(name, value);
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    /// Response handler for operations that declare none.
    pub fn default_response(mut self, handler: Handler) -> Self {
        self.default_response = Some(handler);
        self
    }

    /// Wraps every send of every operation. Client middleware runs outside
    /// operation middleware, in the order added.
    pub fn middleware<F>(mut self, middleware: F) -> Self
    where
        F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Result<Response, Error>>
            + Send
            + Sync
            + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Registers a response-side dependency type.
    pub fn dependency(mut self, hint: TypeHint, handler: Handler) -> Self {
        self.response_dependencies.register(hint, handler);
        self
    }

    /// Registers a request-side dependency type. Parameters inferred to it
    /// cannot be composed, which makes the type unusable as a plain argument.
    pub fn request_dependency(mut self, hint: TypeHint, handler: Handler) -> Self {
        self.request_dependencies.register(hint, handler);
        self
    }

    pub fn parser(mut self, parser: impl ValueParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn build(self) -> Client<T> {
        Client {
            transport: self.transport,
            base_url: self.base_url,
            defaults: self.defaults,
            default_response: self.default_response,
            middleware: self.middleware,
            request_dependencies: self.request_dependencies,
            response_dependencies: self.response_dependencies,
            parser: self.parser,
        }
    }
}
