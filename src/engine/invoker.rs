//! Runs one call of an operation.
//!
//! A call moves through `composing`, then either returns early with the
//! built request, or goes on to `sending` through the client and operation
//! middleware. Response dependencies are resolved next, then the call ends in
//! `resolving` (a response handler is set) or `decoding` (the return type
//! decides). Composition failures abort the call before anything is sent.

use super::client::Client;
use super::middleware::{Middleware, Next};
use super::operation::Operation;
use super::transport::Transport;
use crate::di::{compose, ResolutionScope, Resolver};
use crate::error::Error;
use crate::invocation::{Arguments, Output};
use crate::logging;
use crate::params::signature::{ReturnType, TypeHint};
use crate::request::RequestTemplate;
use crate::response::Response;
use crate::utils;
use std::fmt;
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Composing,
    ReturnEarly,
    Sending,
    Resolving,
    Decoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Composing => "composing",
            Self::ReturnEarly => "return-early",
            Self::Sending => "sending",
            Self::Resolving => "resolving",
            Self::Decoding => "decoding",
        };
        f.write_str(name)
    }
}

fn enter(operation: &Operation, stage: Stage) {
    trace!(target: "restwire::invoker", "{}: {}", operation.name(), stage);
}

/// What a call returns without sending anything.
enum EarlyReturn {
    Template,
    Request,
}

const fn early_return(returns: &ReturnType) -> Option<EarlyReturn> {
    match returns {
        ReturnType::RequestTemplate | ReturnType::Type(TypeHint::RequestTemplate) => {
            Some(EarlyReturn::Template)
        }
        ReturnType::Request | ReturnType::Type(TypeHint::Request) => Some(EarlyReturn::Request),
        _ => None,
    }
}

impl<T: Transport> Client<T> {
    /// Composes the request for one call without sending it.
    ///
    /// The client defaults, the operation's template and the joined URL are
    /// merged in that order, the arguments are composed in, and the
    /// operation's hooks run last.
    ///
    /// # Errors
    /// Returns composition errors and hook failures.
    pub fn prepare(&self, operation: &Operation, args: Arguments) -> Result<RequestTemplate, Error> {
        let base = operation.template();
        let url = base.url.as_deref().unwrap_or_default();
        let joined = self
            .base_url
            .as_deref()
            .map_or_else(|| url.to_string(), |base_url| utils::join_url(base_url, url));

        let location = RequestTemplate {
            method: base.method.clone(),
            url: Some(joined),
            ..RequestTemplate::default()
        };
        let mut template = self.defaults.merge(base).merge(&location);

        compose(
            operation.signature(),
            &mut template,
            args,
            &self.request_dependencies,
        )?;
        operation.run_hooks(&mut template)?;

        debug!(
            target: "restwire::invoker",
            "Composed {} {}",
            operation.name(),
            template.url.as_deref().unwrap_or_default()
        );
        Ok(template)
    }

    /// Calls `operation` with `args`.
    ///
    /// # Errors
    /// Returns composition errors before anything is sent, transport errors
    /// unchanged, and resolution or validation errors from the response
    /// side. Non-success statuses are not errors.
    pub async fn call(&self, operation: &Operation, args: Arguments) -> Result<Output, Error> {
        enter(operation, Stage::Composing);
        let template = self.prepare(operation, args)?;
        let returns = &operation.signature().returns;

        if let Some(early) = early_return(returns) {
            enter(operation, Stage::ReturnEarly);
            return match early {
                EarlyReturn::Template => Ok(Output::Template(Box::new(template))),
                EarlyReturn::Request => Ok(Output::Request(Box::new(template.build()?))),
            };
        }

        enter(operation, Stage::Sending);
        let request = template.build()?;
        logging::log_request(&request);
        let started = Instant::now();
        let chain: Vec<Middleware> = self
            .middleware
            .iter()
            .chain(operation.middleware())
            .cloned()
            .collect();
        let response = Next::new(&chain, &self.transport).run(request).await?;
        logging::log_response(
            &response,
            started.elapsed().as_millis(),
            logging::get_max_body_len(),
        );

        let handler = operation
            .response_handler()
            .or(self.default_response.as_ref());
        let dependencies = operation.response_dependencies();
        if handler.is_some() || !dependencies.is_empty() {
            enter(operation, Stage::Resolving);
            let template_url = template.url.as_deref().unwrap_or_default();
            let resolver = Resolver::new(&self.response_dependencies, self.parser.as_ref())
                .template_url(template_url);
            let mut scope = ResolutionScope::new();
            for dependency in dependencies {
                resolver.resolve_in(dependency, &response, &mut scope)?;
            }
            if let Some(handler) = handler {
                return resolver.resolve_in(handler, &response, &mut scope);
            }
        }

        enter(operation, Stage::Decoding);
        self.decode(returns, response)
    }

    fn decode(&self, returns: &ReturnType, response: Response) -> Result<Output, Error> {
        match returns {
            ReturnType::Unannotated => Ok(response
                .json()
                .map_or_else(|_| Output::Text(response.text()), Output::Json)),
            ReturnType::Nothing => Ok(Output::Nothing),
            ReturnType::Response | ReturnType::Type(TypeHint::Response) => {
                Ok(Output::Response(Box::new(response)))
            }
            ReturnType::Record(record) => {
                let hint = TypeHint::Record(record.clone());
                Ok(Output::Json(self.parser.parse(&hint, response.json()?)?))
            }
            ReturnType::Type(hint) => Ok(Output::Json(
                self.parser.parse_text(hint, &response.text())?,
            )),
            // Handled before sending
            ReturnType::Request | ReturnType::RequestTemplate => {
                Ok(Output::Request(Box::new(response.request)))
            }
        }
    }
}
