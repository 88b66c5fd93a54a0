//! Operations, clients and the call state machine.

pub mod client;
pub mod invoker;
pub mod middleware;
pub mod operation;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use middleware::{BoxFuture, Middleware, Next};
pub use operation::{Hook, Operation, OperationBuilder};
pub use transport::{ReqwestTransport, Transport};
