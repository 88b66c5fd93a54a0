//! Async middleware wrapped around the transport.
//!
//! A middleware receives the finalized request and a [`Next`] handle. It may
//! change the request, call `next.run(request)` to continue down the chain,
//! change the response on the way back, or return a response of its own
//! without sending anything.

use super::transport::Transport;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One link of the send chain.
pub type Middleware =
    Arc<dyn for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Result<Response, Error>> + Send + Sync>;

/// Object-safe view of a [`Transport`].
pub(crate) trait DynTransport: Send + Sync {
    fn send_boxed(&self, request: Request) -> BoxFuture<'_, Result<Response, Error>>;
}

impl<T: Transport> DynTransport for T {
    fn send_boxed(&self, request: Request) -> BoxFuture<'_, Result<Response, Error>> {
        Box::pin(self.send(request))
    }
}

/// The rest of the chain, ending in the transport.
pub struct Next<'a> {
    chain: &'a [Middleware],
    transport: &'a dyn DynTransport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Middleware], transport: &'a dyn DynTransport) -> Self {
        Self { chain, transport }
    }

    /// Passes `request` to the next middleware, or sends it when none is
    /// left.
    pub fn run(self, request: Request) -> BoxFuture<'a, Result<Response, Error>> {
        match self.chain.split_first() {
            Some((first, rest)) => first(
                request,
                Next {
                    chain: rest,
                    transport: self.transport,
                },
            ),
            None => self.transport.send_boxed(request),
        }
    }

    /// Middleware still waiting to run.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.chain.len()
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish_non_exhaustive()
    }
}
