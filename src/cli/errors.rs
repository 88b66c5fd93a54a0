//! Error display formatting for the CLI.

use crate::error::Error;

/// Prints an error message, either as JSON or user-friendly format.
pub fn print_error_with_json(error: &Error, json_format: bool) {
    if !json_format {
        print_error(error);
        return;
    }
    let json_error = error.to_json();
    let Ok(json_output) = serde_json::to_string_pretty(&json_error) else {
        print_error(error);
        return;
    };
    eprintln!("{json_output}");
}

/// Prints a user-friendly error message with a hint when one is known.
pub fn print_error(error: &Error) {
    eprintln!("{}", format_error(error));
}

/// Renders the heading, message and optional hint of an error.
#[must_use]
pub fn format_error(error: &Error) -> String {
    let json_error = error.to_json();
    let heading = heading(&json_error.error_type);
    match json_error.context {
        Some(hint) => format!("{heading}\n{}\n\nHint: {hint}", json_error.message),
        None => format!("{heading}\n{}", json_error.message),
    }
}

fn heading(error_type: &str) -> &str {
    match error_type {
        "FileSystem" => "File System Error",
        "Network" => "Network Error",
        "Transport" => "Connection Error",
        "YAMLParsing" => "YAML Parsing Error",
        "JSONParsing" => "JSON Parsing Error",
        "TOMLParsing" => "TOML Parsing Error",
        "Declaration" => "Declaration Error",
        "Arguments" => "Argument Error",
        "IncompatiblePathParameters" => "Path Parameter Error",
        "Composition" => "Composition Error",
        "Resolution" => "Resolution Error",
        "Validation" => "Validation Error",
        "InvalidUrl" => "Invalid URL",
        "InvalidHeader" => "Invalid Header",
        "Configuration" => "Configuration Error",
        "Handler" => "Handler Error",
        other => other,
    }
}
