//! Immutable operation descriptors and the builder that declares them.

use super::middleware::{BoxFuture, Middleware, Next};
use crate::constants;
use crate::di::Handler;
use crate::error::Error;
use crate::params::convert;
use crate::params::signature::{Param, ReturnType, Signature};
use crate::request::{Body, FilePart, Request, RequestTemplate};
use crate::response::Response;
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Runs on the composed template right before it is built and sent.
pub type Hook = Arc<dyn Fn(&mut RequestTemplate) -> Result<(), Error> + Send + Sync>;

/// A declared HTTP operation: base request, parameter signature, response
/// handling and the hooks and middleware around sending.
#[derive(Clone)]
pub struct Operation {
    name: String,
    template: RequestTemplate,
    signature: Signature,
    response: Option<Handler>,
    response_dependencies: Vec<Handler>,
    hooks: Vec<Hook>,
    middleware: Vec<Middleware>,
}

impl Operation {
    #[must_use]
    pub fn request(method: Method, url: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(method, url)
    }

    #[must_use]
    pub fn get(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::GET, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::POST, url)
    }

    #[must_use]
    pub fn put(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::PUT, url)
    }

    #[must_use]
    pub fn patch(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::PATCH, url)
    }

    #[must_use]
    pub fn delete(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::DELETE, url)
    }

    #[must_use]
    pub fn head(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::HEAD, url)
    }

    #[must_use]
    pub fn options(url: impl Into<String>) -> OperationBuilder {
        Self::request(Method::OPTIONS, url)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn template(&self) -> &RequestTemplate {
        &self.template
    }

    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub const fn response_handler(&self) -> Option<&Handler> {
        self.response.as_ref()
    }

    /// Handlers resolved against the response before the response handler,
    /// sharing its dependency cache.
    #[must_use]
    pub fn response_dependencies(&self) -> &[Handler] {
        &self.response_dependencies
    }

    #[must_use]
    pub fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }

    /// Runs every request hook in declaration order.
    ///
    /// # Errors
    /// Stops at the first hook that fails.
    pub fn run_hooks(&self, template: &mut RequestTemplate) -> Result<(), Error> {
        self.hooks.iter().try_for_each(|hook| hook(template))
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("method", &self.template.method)
            .field("url", &self.template.url)
            .field("params", &self.signature.params.len())
            .field("response", &self.response)
            .field("response_dependencies", &self.response_dependencies)
            .field("hooks", &self.hooks.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Declares an [`Operation`].
///
/// Fixed request values that fail validation (such as an invalid header
/// name) are reported by [`OperationBuilder::build`].
#[must_use]
pub struct OperationBuilder {
    name: Option<String>,
    template: RequestTemplate,
    signature: Signature,
    response: Option<Handler>,
    response_dependencies: Vec<Handler>,
    hooks: Vec<Hook>,
    middleware: Vec<Middleware>,
    error: Option<Error>,
}

impl OperationBuilder {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            name: None,
            template: RequestTemplate::new(method, url),
            signature: Signature::new(),
            response: None,
            response_dependencies: Vec::new(),
            hooks: Vec::new(),
            middleware: Vec::new(),
            error: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    /// Replaces the whole signature, return type included.
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn returns(mut self, returns: ReturnType) -> Self {
        self.signature = self.signature.returns(returns);
        self
    }

    /// Handler that turns the response into the call's result.
    pub fn response(mut self, handler: Handler) -> Self {
        self.response = Some(handler);
        self
    }

    /// Handler run against the response for its side effects, such as a
    /// status check. Its result is discarded; an error fails the call.
    pub fn response_depends(mut self, handler: Handler) -> Self {
        self.response_dependencies.push(handler);
        self
    }

    /// Wraps sends of this operation, inside any client middleware.
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

    pub fn hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestTemplate) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    fn record(mut self, result: Result<(), Error>) -> Self {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        self.template.params.remove(&key);
        for item in convert::to_multi(&value.into()) {
            self.template.params.append(key.clone(), item);
        }
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        let result = self.template.set_header(name, value);
        self.record(result)
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.template.set_cookie(name, value);
        self
    }

    /// Fixes a path placeholder. Sequences are joined with `/`.
    pub fn path(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = convert::to_path_value(&value.into(), constants::DEFAULT_PATH_DELIMITER);
        self.template.set_path_param(name, value);
        self
    }

    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.template.params.extend(params);
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            if let Err(e) = self.template.append_header(name.as_ref(), value.as_ref()) {
                return self.record(Err(e));
            }
        }
        self
    }

    pub fn cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in cookies {
            self.template.set_cookie(name, value);
        }
        self
    }

    pub fn path_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self.template.set_path_param(name, value);
        }
        self
    }

    /// Raw body bytes.
    pub fn content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.template.body = Some(Body::Raw(content.into()));
        self
    }

    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.template.body = Some(Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    pub fn files(mut self, files: Vec<FilePart>) -> Self {
        self.template.body = Some(Body::Files(files));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.template.set_json(value, None);
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.template.timeout = Some(timeout);
        self
    }

    /// Sets `Accept` to the comma-joined media types.
    pub fn accept(self, media_types: &[&str]) -> Self {
        let joined = media_types.join(", ");
        self.header(constants::HEADER_ACCEPT, &joined)
    }

    pub fn referer(self, referer: &str) -> Self {
        self.header(constants::HEADER_REFERER, referer)
    }

    pub fn user_agent(self, user_agent: &str) -> Self {
        self.header(constants::HEADER_USER_AGENT, user_agent)
    }

    /// Seeds the request-side state.
    pub fn state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.template.state.insert(key.into(), value);
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    /// Returns the first error recorded while setting fixed request values.
    pub fn build(self) -> Result<Operation, Error> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Operation {
            name: self
                .name
                .unwrap_or_else(|| constants::DEFAULT_OPERATION_NAME.to_string()),
            template: self.template,
            signature: self.signature,
            response: self.response,
            response_dependencies: self.response_dependencies,
            hooks: self.hooks,
            middleware: self.middleware,
        })
    }
}
