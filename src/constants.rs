//! Centralized string constants for restwire
//!
//! This module contains commonly used string literals to:
//! - Reduce string duplication
//! - Improve maintainability
//! - Ensure consistency across the codebase

// HTTP Headers
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_COOKIE: &str = "Cookie";
pub const HEADER_REFERER: &str = "Referer";
pub const HEADER_USER_AGENT: &str = "User-Agent";

// Content Types
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
pub const CONTENT_TYPE_MULTIPART: &str = "multipart/form-data";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";

// Authentication Schemes
pub const AUTH_SCHEME_BEARER: &str = "Bearer";
pub const AUTH_SCHEME_BASIC: &str = "Basic";

// Environment Variables
pub const ENV_RESTWIRE_CONFIG_DIR: &str = "RESTWIRE_CONFIG_DIR";
pub const ENV_RESTWIRE_BASE_URL: &str = "RESTWIRE_BASE_URL";
pub const ENV_RESTWIRE_TIMEOUT_SECS: &str = "RESTWIRE_TIMEOUT_SECS";
pub const ENV_RESTWIRE_LOG: &str = "RESTWIRE_LOG";
pub const ENV_RESTWIRE_LOG_FORMAT: &str = "RESTWIRE_LOG_FORMAT";
pub const ENV_RESTWIRE_LOG_FILE: &str = "RESTWIRE_LOG_FILE";
pub const ENV_RESTWIRE_LOG_MAX_BODY: &str = "RESTWIRE_LOG_MAX_BODY";

// Error Context Messages
pub const ERR_CONNECTION: &str = "Check that the API server is running and accessible.";
pub const ERR_TIMEOUT: &str = "The API server may be slow or unresponsive. Try again later.";
pub const ERR_FILE_NOT_FOUND: &str = "Check that the file path is correct and the file exists.";
pub const ERR_PERMISSION: &str = "Check file permissions or run with appropriate privileges.";
pub const ERR_JSON_SYNTAX: &str = "Check that your request body or response contains valid JSON.";
pub const ERR_TOML_SYNTAX: &str = "Check that your configuration file is valid TOML syntax.";
pub const ERR_DECLARATION: &str =
    "Check the parameter markers and aliases declared on the operation.";
pub const ERR_PATH_PARAMS: &str =
    "Every {placeholder} in the URL needs a path parameter or a fixed path value.";
pub const ERR_ARGUMENTS: &str = "Check the arguments passed against the operation signature.";
pub const ERR_HANDLER: &str = "A response handler or dependency returned an error.";

// Default Values
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PATH_DELIMITER: &str = "/";
pub const DEFAULT_LOG_MAX_BODY: usize = 1000;
pub const DEFAULT_OPERATION_NAME: &str = "unnamed";

// File names
pub const CONFIG_FILENAME: &str = "config.toml";
pub const CONFIG_DIR_NAME: &str = "restwire";

/// Check if a header name is authentication-related
#[must_use]
pub fn is_auth_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "authorization"
            | "proxy-authorization"
            | "x-api-key"
            | "x-api-token"
            | "x-auth-token"
            | "api-key"
            | "token"
            | "bearer"
            | "cookie"
    )
}
