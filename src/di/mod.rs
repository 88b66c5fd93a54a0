//! Parameter inference, request composition and response resolution.

pub mod compose;
pub mod inference;
pub mod registry;
pub mod resolve;

pub use compose::compose;
pub use inference::{infer, InferenceContext};
pub use registry::{DependencyRegistry, Profile};
pub use resolve::{ResolutionScope, Resolver};

use crate::error::Error;
use crate::invocation::{Output, ResolvedArgs};
use crate::params::signature::Signature;
use std::fmt;
use std::sync::Arc;

type HandlerFn = dyn Fn(&ResolvedArgs) -> Result<Output, Error> + Send + Sync;

/// Identity of a handler: two clones of the same handler share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

/// A callable with a declared signature, used for response handlers and
/// dependencies.
#[derive(Clone)]
pub struct Handler {
    name: String,
    signature: Arc<Signature>,
    func: Arc<HandlerFn>,
}

impl Handler {
    pub fn new<F>(name: impl Into<String>, signature: Signature, func: F) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<Output, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Arc::new(signature),
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn id(&self) -> HandlerId {
        HandlerId(Arc::as_ptr(&self.func).cast::<()>() as usize)
    }

    /// Invokes the handler with already-resolved arguments.
    ///
    /// # Errors
    /// Returns whatever the handler body returns.
    pub fn call(&self, args: &ResolvedArgs) -> Result<Output, Error> {
        (self.func)(args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.signature.params.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_follows_the_callable() {
        let make = || Handler::new("one", Signature::new(), |_| Ok(Output::Json(json!(1))));
        let first = make();
        let clone = first.clone();
        let other = make();
        assert_eq!(first.id(), clone.id());
        assert_ne!(first.id(), other.id());
        assert_eq!(first.call(&ResolvedArgs::new()).unwrap(), Output::Json(json!(1)));
    }
}
