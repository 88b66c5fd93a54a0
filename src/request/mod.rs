//! Request drafts and finalized requests.
//!
//! A [`RequestTemplate`] is the mutable draft that operations, clients and
//! composed arguments are merged into. [`RequestTemplate::build`] turns it into
//! a [`Request`], the value handed to the transport.

pub mod body;
pub mod params;

pub use body::{Body, FilePart, RenderedBody};
pub use params::QueryParams;

use crate::constants;
use crate::error::Error;
use crate::state::State;
use crate::utils;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Mutable draft of an outgoing request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTemplate {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub params: QueryParams,
    pub headers: HeaderMap,
    pub cookies: IndexMap<String, String>,
    pub path_params: IndexMap<String, String>,
    pub body: Option<Body>,
    pub timeout: Option<Duration>,
    pub state: IndexMap<String, Value>,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Overlays `other` onto this template.
    ///
    /// Method, URL, body and timeout come from `other` when it sets them.
    /// Query params, headers, cookies, path params and state merge key-wise
    /// with `other` winning on collision.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut headers = self.headers.clone();
        for name in other.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &other.headers {
            headers.append(name.clone(), value.clone());
        }

        let mut cookies = self.cookies.clone();
        cookies.extend(other.cookies.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut path_params = self.path_params.clone();
        path_params.extend(other.path_params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut state = self.state.clone();
        state.extend(other.state.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            method: other.method.clone().or_else(|| self.method.clone()),
            url: other.url.clone().or_else(|| self.url.clone()),
            params: self.params.merge(&other.params),
            headers,
            cookies,
            path_params,
            body: other.body.clone().or_else(|| self.body.clone()),
            timeout: other.timeout.or(self.timeout),
            state,
        }
    }

    /// Sets a JSON body.
    ///
    /// Without an embed key the value becomes the whole JSON root. With one,
    /// the value is stored under that key of the existing JSON object, which
    /// is created when the body is not already a JSON object.
    pub fn set_json(&mut self, value: Value, embed: Option<&str>) {
        let Some(key) = embed else {
            self.body = Some(Body::Json(value));
            return;
        };

        let mut root = match self.body.take() {
            Some(Body::Json(Value::Object(map))) => map,
            _ => Map::new(),
        };
        root.insert(key.to_string(), value);
        self.body = Some(Body::Json(Value::Object(root)));
    }

    /// The current JSON body, if that is the active representation.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        match &self.body {
            Some(Body::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Replaces every value of a header.
    ///
    /// # Errors
    /// Returns an error for an invalid header name or value.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Adds a header value, keeping existing ones.
    ///
    /// # Errors
    /// Returns an error for an invalid header name or value.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    /// First value of a header as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.path_params.insert(name.into(), value.into());
    }

    /// Placeholders of the URL that have no path parameter yet.
    #[must_use]
    pub fn missing_path_params(&self) -> Vec<String> {
        self.url.as_deref().map_or_else(Vec::new, |url| {
            utils::placeholders(url)
                .into_iter()
                .filter(|name| !self.path_params.contains_key(name))
                .collect()
        })
    }

    /// Finalizes the draft into a sendable request.
    ///
    /// # Errors
    /// Fails with `IncompatiblePathParameters` when a placeholder has no
    /// value, or with a header/body error when those cannot be rendered.
    pub fn build(&self) -> Result<Request, Error> {
        let template_url = self.url.clone().unwrap_or_default();

        let encoded: IndexMap<String, String> = self
            .path_params
            .iter()
            .map(|(k, v)| (k.clone(), encode_path_value(v)))
            .collect();
        let (mut url, missing) = utils::substitute_placeholders(&template_url, &encoded);
        if !missing.is_empty() {
            return Err(Error::incompatible_path_parameters(missing));
        }

        if !self.params.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&self.params.to_query_string());
        }

        let mut headers = self.headers.clone();
        if !self.cookies.is_empty() {
            let mut rendered: Vec<String> = headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_string))
                .collect();
            rendered.extend(self.cookies.iter().map(|(k, v)| format!("{k}={v}")));
            let value = HeaderValue::from_str(&rendered.join("; "))
                .map_err(|e| Error::invalid_header(constants::HEADER_COOKIE, e.to_string()))?;
            headers.insert(COOKIE, value);
        }

        let body = match &self.body {
            Some(body) => {
                let rendered = body.render()?;
                if let Some(content_type) = rendered.content_type {
                    if !headers.contains_key(CONTENT_TYPE) {
                        let value = HeaderValue::from_str(&content_type).map_err(|e| {
                            Error::invalid_header(constants::HEADER_CONTENT_TYPE, e.to_string())
                        })?;
                        headers.insert(CONTENT_TYPE, value);
                    }
                }
                Some(rendered.bytes)
            }
            None => None,
        };

        Ok(Request {
            method: self.method.clone().unwrap_or(Method::GET),
            url,
            headers,
            body,
            timeout: self.timeout,
            state: State::from_map(self.state.clone()),
        })
    }

    /// JSON view of the draft, with credentials redacted.
    #[must_use]
    pub fn describe(&self) -> Value {
        json!({
            "method": self.method.as_ref().map(Method::as_str),
            "url": self.url,
            "params": self.params.iter().map(|(k, v)| json!([k, v])).collect::<Vec<_>>(),
            "headers": describe_headers(&self.headers),
            "cookies": self.cookies,
            "path_params": self.path_params,
            "body": self.body.as_ref().map(Body::describe),
            "timeout_secs": self.timeout.map(|t| t.as_secs_f64()),
            "state": self.state,
        })
    }
}

/// Characters a path segment may carry literally: unreserved characters,
/// sub-delimiters, `:` and `@`, plus `/` between segments. Sequence values
/// joined with any of these keep their delimiter.
const PATH_SAFE: &str = "-._~!$&'()*+,;=:@/";

/// Percent-encodes everything in a path value that is not allowed in a path.
fn encode_path_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || PATH_SAFE.contains(ch) {
            encoded.push(ch);
        } else {
            let mut buf = [0; 4];
            encoded.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    encoded
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::invalid_header(name, e.to_string()))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|e| Error::invalid_header(name, e.to_string()))?;
    Ok((header_name, header_value))
}

pub(crate) fn describe_headers(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|value| {
                if constants::is_auth_header(name.as_str()) {
                    Value::String("[REDACTED]".to_string())
                } else {
                    Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned())
                }
            })
            .collect();
        let entry = if values.len() == 1 {
            values.into_iter().next().unwrap_or(Value::Null)
        } else {
            Value::Array(values)
        };
        map.insert(name.as_str().to_string(), entry);
    }
    Value::Object(map)
}

/// A finalized request as handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    pub state: State,
}

impl Request {
    /// Query parameters carried by the URL.
    #[must_use]
    pub fn query(&self) -> QueryParams {
        self.url
            .split_once('?')
            .map_or_else(QueryParams::new, |(_, query)| {
                QueryParams::parse(query.split('#').next().unwrap_or(query))
            })
    }

    /// Cookies sent in the `Cookie` header.
    #[must_use]
    pub fn cookies(&self) -> IndexMap<String, String> {
        let mut cookies = IndexMap::new();
        for value in self.headers.get_all(COOKIE) {
            let Ok(text) = value.to_str() else {
                continue;
            };
            for pair in text.split(';') {
                if let Some((name, value)) = pair.trim().split_once('=') {
                    cookies.insert(name.trim().to_string(), value.trim().to_string());
                }
            }
        }
        cookies
    }

    #[must_use]
    pub fn body_text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// JSON view of the request, with credentials redacted.
    #[must_use]
    pub fn describe(&self) -> Value {
        let body = self.body.as_ref().map(|bytes| {
            serde_json::from_slice::<Value>(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
        });
        json!({
            "method": self.method.as_str(),
            "url": self.url,
            "headers": describe_headers(&self.headers),
            "body": body,
            "timeout_secs": self.timeout.map(|t| t.as_secs_f64()),
            "state": self.state.to_value(),
        })
    }
}
