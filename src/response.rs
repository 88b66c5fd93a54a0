use crate::error::Error;
use crate::request::Request;
use crate::state::State;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

/// A completed response together with the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub reason: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub request: Request,
    pub state: State,
}

impl Response {
    /// Creates a response with the canonical reason phrase for `status`.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>, request: Request) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            request,
            state: State::new(),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns an error if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, Error> {
        serde_json::from_slice(&self.body).map_err(Error::from)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookies set by this response, read from `Set-Cookie`.
    #[must_use]
    pub fn cookies(&self) -> IndexMap<String, String> {
        let mut cookies = IndexMap::new();
        for value in self.headers.get_all(SET_COOKIE) {
            let Ok(text) = value.to_str() else {
                continue;
            };
            let pair = text.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        cookies
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn describe(&self) -> Value {
        json!({
            "status": self.status.as_u16(),
            "reason": self.reason,
            "headers": crate::request::describe_headers(&self.headers),
            "body": self.json().unwrap_or_else(|_| Value::String(self.text())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestTemplate;
    use reqwest::header::HeaderValue;
    use reqwest::Method;

    fn request() -> Request {
        RequestTemplate::new(Method::GET, "https://api.test/ping")
            .build()
            .unwrap()
    }

    #[test]
    fn test_cookies_parsed_from_set_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("sid=123; Path=/; HttpOnly"));
        headers.append(SET_COOKIE, HeaderValue::from_static("theme=dark"));
        let response = Response::new(StatusCode::OK, headers, Vec::new(), request());

        let cookies = response.cookies();
        assert_eq!(cookies.get("sid").map(String::as_str), Some("123"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn test_reason_and_body_helpers() {
        let response = Response::new(
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            br#"{"detail":"missing"}"#.to_vec(),
            request(),
        );
        assert_eq!(response.reason, "Not Found");
        assert_eq!(response.json().unwrap()["detail"], "missing");
        assert!(!response.is_success());
    }
}
