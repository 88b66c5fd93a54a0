//! Rendering of call results for the terminal.

use super::OutputFormat;
use crate::error::Error;
use crate::invocation::Output;

/// Renders a call result in the requested format. Plain text results are
/// printed as they are.
///
/// # Errors
/// Returns an error if the value cannot be serialized.
pub fn render(output: &Output, format: OutputFormat) -> Result<String, Error> {
    if let Output::Text(text) = output {
        return Ok(text.clone());
    }
    let value = output.to_value();
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&value)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
    }
}
