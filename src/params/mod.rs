pub mod convert;
pub mod signature;
pub mod spec;

pub use signature::{
    ClassRef, DefaultValue, Param, ParamKind, RecordField, RecordType, ReturnType, Signature,
    TypeHint,
};
pub use spec::{Dependency, Destination, ParameterSpec, PromiseTarget, StateSide};
