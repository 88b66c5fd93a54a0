//! Declarative typed HTTP operations.
//!
//! An [`Operation`](engine::Operation) pairs a base request with a parameter
//! [`Signature`](params::Signature). Calling it through a
//! [`Client`](engine::Client) composes the arguments into the request
//! (inferring where each parameter goes when it carries no explicit marker),
//! sends it, and either resolves a response handler against the response or
//! decodes the body according to the declared return type.

pub mod cli;
pub mod config;
pub mod constants;
pub mod di;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod fs;
pub mod invocation;
pub mod logging;
pub mod params;
pub mod parse;
pub mod request;
pub mod response;
pub mod state;
pub mod utils;

pub use engine::{Client, Operation};
pub use error::Error;
pub use invocation::{Arguments, Output};
