//! Conversion of arbitrary serialisable values into JSON trees.

use crate::error::Error;
use serde::Serialize;
use serde_json::Value;

/// Encodes any serialisable value into the JSON tree the engine works with.
///
/// # Errors
/// Returns an error if the value's `Serialize` implementation fails, for
/// example a map with non-string keys.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(Error::from)
}
