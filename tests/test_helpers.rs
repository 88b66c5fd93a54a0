#![allow(dead_code)]

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use restwire::engine::Transport;
use restwire::error::Error;
use restwire::request::Request;
use restwire::response::Response;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// In-memory transport that records every request and answers each one with
/// the same canned response.
#[derive(Clone)]
pub struct RecordingTransport {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, &value.to_string())
            .with_header("content-type", "application/json")
    }

    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.append(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
        self
    }

    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    #[must_use]
    pub fn sent(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, request: Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(Response::new(
            self.status,
            self.headers.clone(),
            self.body.clone(),
            request,
        ))
    }
}
