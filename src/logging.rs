//! Request and response logging with credential redaction.
//!
//! Request lines and status lines are logged at `info`, headers at `debug`
//! and bodies at `trace`, all under the `restwire::invoker` target. Header
//! values that carry credentials are replaced with `[REDACTED]`.

use crate::constants;
use crate::request::Request;
use crate::response::Response;
use reqwest::header::HeaderMap;
use tracing::{debug, info, trace};

/// Checks if a header name should be redacted
#[must_use]
pub fn should_redact_header(header_name: &str) -> bool {
    if constants::is_auth_header(header_name) {
        return true;
    }
    let lower = header_name.to_lowercase();
    matches!(
        lower.as_str(),
        "api_key" | "secret" | "password" | "x-access-token" | "x-secret-token" | "set-cookie"
    )
}

fn log_headers(label: &str, headers: &HeaderMap) {
    if headers.is_empty() {
        return;
    }
    debug!(target: "restwire::invoker", "{} headers:", label);
    for (name, value) in headers {
        let display_value = if should_redact_header(name.as_str()) {
            "[REDACTED]".to_string()
        } else {
            String::from_utf8_lossy(value.as_bytes()).to_string()
        };
        debug!(
            target: "restwire::invoker",
            "  {}: {}",
            name.as_str(),
            display_value
        );
    }
}

/// Logs an outgoing request
pub fn log_request(request: &Request) {
    info!(
        target: "restwire::invoker",
        "→ {} {}",
        request.method,
        request.url
    );
    log_headers("Request", &request.headers);

    if let Some(body) = request.body_text() {
        trace!(target: "restwire::invoker", "Request body: {}", body);
    }
}

/// Logs a received response together with the time it took
pub fn log_response(response: &Response, duration_ms: u128, max_body_len: usize) {
    info!(
        target: "restwire::invoker",
        "← {} {} ({}ms)",
        response.status.as_u16(),
        response.reason,
        duration_ms
    );
    log_headers("Response", &response.headers);
    log_response_body(&response.text(), max_body_len);
}

fn log_response_body(body: &str, max_body_len: usize) {
    if body.is_empty() {
        return;
    }

    match truncate(body, max_body_len) {
        Some(head) => trace!(
            target: "restwire::invoker",
            "Response body: {} (truncated at {} chars)",
            head,
            max_body_len
        ),
        None => trace!(target: "restwire::invoker", "Response body: {}", body),
    }
}

/// Cuts `body` to at most `max_chars` characters. `None` when it already fits.
fn truncate(body: &str, max_chars: usize) -> Option<&str> {
    body.char_indices()
        .nth(max_chars)
        .map(|(byte_index, _)| &body[..byte_index])
}

/// Gets the maximum body length from `RESTWIRE_LOG_MAX_BODY`
#[must_use]
pub fn get_max_body_len() -> usize {
    std::env::var(constants::ENV_RESTWIRE_LOG_MAX_BODY)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(constants::DEFAULT_LOG_MAX_BODY)
}
