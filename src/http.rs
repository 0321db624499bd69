//! Blocking HTTP facade over the service's versioned REST surface.
//!
//! Status codes are data here: every completed round trip returns
//! `ApiResponse`, whatever the status. Only transport failures (timeouts,
//! refused connections, DNS) surface as errors, and they are left for the
//! scenario boundary to classify.
use crate::config::HarnessConfig;
use crate::util::truncate_string;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use ureq::{Agent, RequestBuilder};

/// Bodies echoed into failure messages are cut to this many bytes.
const MAX_BODY_SNIPPET_BYTES: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded response body: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// JSON body, or `Value::Null` for text bodies so extraction reports a
    /// shape error instead of a transport one.
    pub fn json_or_null(&self) -> Value {
        self.json().cloned().unwrap_or(Value::Null)
    }

    /// Bounded rendering for logs and failure messages.
    pub fn snippet(&self) -> String {
        let rendered = match &self.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
        };
        truncate_string(&rendered, MAX_BODY_SNIPPET_BYTES)
    }
}

/// Single file part of a `multipart/form-data` upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.bytes.len() + 256);
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                self.field, self.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", self.content_type).as_bytes());
        body.extend_from_slice(&self.bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }
}

/// Connection handle shared by every scenario of a run.
pub struct ApiClient {
    agent: Agent,
    config: HarnessConfig,
}

impl ApiClient {
    pub fn new(config: &HarnessConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            config: config.clone(),
        }
    }

    pub fn request(&self, method: Method, path: &str) -> ApiRequest<'_> {
        ApiRequest::new(self, method, path)
    }

    pub fn get(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::Post, path)
    }

    pub fn patch(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::Patch, path)
    }

    pub fn put(&self, path: &str) -> ApiRequest<'_> {
        self.request(Method::Put, path)
    }

    fn execute(&self, request: ApiRequest<'_>) -> Result<ApiResponse> {
        let url = self.config.api_url(&request.path);
        let started = Instant::now();
        let result = match request.method {
            Method::Get => decorate(self.agent.get(&url), &request).call(),
            Method::Post => send_with_body(decorate(self.agent.post(&url), &request), &request),
            Method::Patch => send_with_body(decorate(self.agent.patch(&url), &request), &request),
            Method::Put => send_with_body(decorate(self.agent.put(&url), &request), &request),
        };
        let mut response =
            result.with_context(|| format!("{} {}", request.method, request.path))?;

        let status = response.status().as_u16();
        let raw = response
            .body_mut()
            .read_to_vec()
            .with_context(|| format!("read body of {} {}", request.method, request.path))?;
        let body = decode_body(&raw);

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            elapsed_ms = started.elapsed().as_millis(),
            "request complete"
        );
        Ok(ApiResponse { status, body })
    }
}

/// Request under construction; `send` performs the round trip.
pub struct ApiRequest<'a> {
    client: &'a ApiClient,
    method: Method,
    path: String,
    json: Option<Value>,
    file: Option<FilePart>,
    token: Option<String>,
    query: Vec<(String, String)>,
}

impl<'a> ApiRequest<'a> {
    fn new(client: &'a ApiClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            json: None,
            file: None,
            token: None,
            query: Vec::new(),
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    /// Adds `Authorization: Bearer <token>`.
    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn send(self) -> Result<ApiResponse> {
        let client = self.client;
        client.execute(self)
    }
}

/// Undecodable bytes are replaced rather than failing a completed round trip.
fn decode_body(raw: &[u8]) -> ResponseBody {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => ResponseBody::Json(value),
        Err(_) => ResponseBody::Text(String::from_utf8_lossy(raw).into_owned()),
    }
}

fn decorate<B>(mut builder: RequestBuilder<B>, request: &ApiRequest<'_>) -> RequestBuilder<B> {
    for (key, value) in &request.query {
        builder = builder.query(key, value);
    }
    if let Some(token) = &request.token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder
}

fn send_with_body(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    request: &ApiRequest<'_>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    if let Some(part) = &request.file {
        let boundary = format!("----contract-harness-{:016x}", rand::random::<u64>());
        let body = part.encode(&boundary);
        return builder
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .send(&body[..]);
    }
    match &request.json {
        Some(json) => builder.send_json(json),
        None => builder.send_empty(),
    }
}
