//! HTTP/JSON façade over the hub's REST backend.
//!
//! Every backend call goes through [`HttpClient`]:
//!
//! 1. [`prepare`] turns a path plus [`RequestOptions`] into a
//!    [`PreparedRequest`]. JSON bodies are serialized, and
//!    `Content-Type: application/json` is added when the caller set none
//!    and the body is not multipart.
//! 2. A [`Transport`] performs the round trip. The default is the blocking
//!    `ureq` agent in [`transport::UreqTransport`].
//! 3. The body is parsed as JSON, falling back to raw text.
//! 4. A non-2xx status becomes an [`ApiError`] whose message is built by
//!    [`error_message`]. That error is the only failure channel: no
//!    retries, no backoff.

pub mod multipart;
pub mod stream;
pub mod transport;

use std::fmt;
use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use multipart::MultipartForm;
pub use stream::Utf8StreamDecoder;
pub use transport::{RawResponse, Transport, UreqTransport};

// ---------------------------------------------------------------------------
// Request description
// ---------------------------------------------------------------------------

/// HTTP verbs used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    /// Serialized with `serde_json` before sending.
    Json(Value),
    /// Sent verbatim.
    Text(String),
    Multipart(MultipartForm),
}

/// Method, headers and body of one call.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Body,
    /// Overrides the transport's default timeout.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            headers: Vec::new(),
            body: Body::Empty,
            timeout: None,
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            ..Self::get()
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Body::Json(body),
            ..Self::get()
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::Put,
            body: Body::Json(body),
            ..Self::get()
        }
    }

    pub fn multipart(form: MultipartForm) -> Self {
        Self {
            method: Method::Post,
            body: Body::Multipart(form),
            ..Self::get()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl PreparedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Body as UTF-8 text, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Join the base URL and path, encode the body and settle the content type.
pub fn prepare(base_url: &str, path: &str, options: RequestOptions) -> PreparedRequest {
    let url = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    let mut headers = options.headers;
    let has_content_type = find_header(&headers, "Content-Type").is_some();

    let body = match options.body {
        Body::Empty => None,
        Body::Json(value) => {
            if !has_content_type {
                headers.push(json_content_type());
            }
            Some(value.to_string().into_bytes())
        }
        Body::Text(text) => {
            if !has_content_type {
                headers.push(json_content_type());
            }
            Some(text.into_bytes())
        }
        Body::Multipart(form) => {
            // The boundary lives in the header, so the form always owns it.
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case("Content-Type"));
            headers.push(("Content-Type".to_string(), form.content_type()));
            Some(form.encode())
        }
    };

    PreparedRequest {
        method: options.method,
        url,
        headers,
        body,
        timeout: options.timeout,
    }
}

fn json_content_type() -> (String, String) {
    ("Content-Type".to_string(), "application/json".to_string())
}

// ---------------------------------------------------------------------------
// Response payload
// ---------------------------------------------------------------------------

/// A response body: JSON when it parses, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse a body, falling back to raw text.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    /// The payload as a JSON value (`Null` for empty, a string for text).
    pub fn into_json(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// A 2xx response: status line plus parsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub payload: Payload,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// The single failure type of the façade.
///
/// `status` is `None` for network/transport failures and the HTTP status
/// otherwise. `Display` prints the message alone so it can go straight into
/// a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: Option<u16>,
    /// Reason phrase of the response; empty for transport failures.
    pub status_text: String,
    pub message: String,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            status_text: String::new(),
            message: message.into(),
        }
    }

    pub fn http(status: u16, status_text: &str, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            status_text: status_text.to_string(),
            message: message.into(),
        }
    }

    /// `"503 Service Unavailable"`, or `"unreachable"` without a response.
    pub fn status_line(&self) -> String {
        match self.status {
            Some(code) if self.status_text.is_empty() => code.to_string(),
            Some(code) => format!("{code} {}", self.status_text),
            None => "unreachable".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Message for a non-2xx response.
///
/// Preference order: `detail` string field, `error` string field, a bare
/// JSON string, any other structured JSON (compact), then the status text.
/// Unstructured text bodies fall through to the status text.
pub fn error_message(status: u16, status_text: &str, payload: &Payload) -> String {
    let fallback = || {
        if status_text.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            status_text.to_string()
        }
    };

    match payload {
        Payload::Json(Value::Object(map)) => ["detail", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Payload::Json(Value::String(s)) if !s.is_empty() => s.clone(),
        Payload::Json(Value::Null) => fallback(),
        Payload::Json(other) => other.to_string(),
        Payload::Text(_) | Payload::Empty => fallback(),
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Base URL plus transport. Cheap to share by reference across threads.
pub struct HttpClient {
    base_url: String,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub fn new(base_url: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and return the parsed payload.
    ///
    /// Failures carry an [`ApiError`] as their root cause.
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<Payload> {
        self.send(path, options).map(|response| response.payload)
    }

    /// Like [`request`](Self::request), keeping the 2xx status line.
    pub fn send(&self, path: &str, options: RequestOptions) -> Result<Response> {
        let prepared = prepare(&self.base_url, path, options);
        let raw = self
            .transport
            .send(&prepared)
            .map_err(|e| ApiError::transport(format!("{e:#}")))?;

        let status = raw.status;
        let status_text = raw.status_text.clone();
        let text = read_body(raw.body)?;
        let payload = Payload::parse(&text);

        if !is_success(status) {
            let message = error_message(status, &status_text, &payload);
            return Err(ApiError::http(status, &status_text, message).into());
        }
        Ok(Response {
            status,
            status_text,
            payload,
        })
    }

    /// Issue a request and return the payload as a JSON value.
    pub fn value(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.request(path, options).map(Payload::into_json)
    }

    /// Issue a request and deserialize the payload into `T`.
    pub fn json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        let value = self.value(path, options)?;
        serde_json::from_value(value)
            .with_context(|| format!("unexpected response shape from {path}"))
    }

    /// Issue a request whose 2xx body is a UTF-8 text stream.
    ///
    /// `on_chunk` receives decoded text as it arrives; the full text is
    /// returned once the body ends. Non-2xx responses are read whole and
    /// reported like [`request`](Self::request).
    pub fn stream(
        &self,
        path: &str,
        options: RequestOptions,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<String> {
        let prepared = prepare(&self.base_url, path, options);
        let raw = self
            .transport
            .send(&prepared)
            .map_err(|e| ApiError::transport(format!("{e:#}")))?;

        if !is_success(raw.status) {
            let text = read_body(raw.body)?;
            let payload = Payload::parse(&text);
            let message = error_message(raw.status, &raw.status_text, &payload);
            return Err(ApiError::http(raw.status, &raw.status_text, message).into());
        }

        let mut reader = raw.body;
        let mut decoder = Utf8StreamDecoder::default();
        let mut full = String::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| ApiError::transport(format!("stream interrupted: {e}")))?;
            if n == 0 {
                break;
            }
            let text = decoder.decode(&buf[..n]);
            if !text.is_empty() {
                on_chunk(&text);
                full.push_str(&text);
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            on_chunk(&tail);
            full.push_str(&tail);
        }
        Ok(full)
    }
}

fn read_body(mut body: Box<dyn Read + Send>) -> Result<String> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)
        .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_gets_content_type_and_serialized_text() {
        let req = prepare("http://hub", "/tasks", RequestOptions::post(json!({"a": 1})));
        assert_eq!(req.url, "http://hub/tasks");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.body_text(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let options = RequestOptions {
            body: Body::Text("a,b\n1,2".to_string()),
            ..RequestOptions::post(Value::Null)
        }
        .header("content-type", "text/csv");
        let req = prepare("http://hub/", "notes", options);
        assert_eq!(req.url, "http://hub/notes");
        let content_types: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(req.header("Content-Type"), Some("text/csv"));
        assert_eq!(req.body_text(), Some("a,b\n1,2"));
    }

    #[test]
    fn multipart_body_uses_form_content_type() {
        let form = MultipartForm::with_boundary("XYZ").text("kind", "csv");
        let req = prepare("http://hub", "/budget/import", RequestOptions::multipart(form));
        assert_eq!(
            req.header("Content-Type"),
            Some("multipart/form-data; boundary=XYZ")
        );
        assert!(req.body_text().unwrap().contains("name=\"kind\""));
    }

    #[test]
    fn get_without_body_has_no_content_type() {
        let req = prepare("http://hub", "/env", RequestOptions::get());
        assert!(req.header("Content-Type").is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn absolute_urls_bypass_base() {
        let req = prepare("http://hub", "http://other:1/x", RequestOptions::get());
        assert_eq!(req.url, "http://other:1/x");
    }

    #[test]
    fn payload_parse_falls_back_to_text() {
        assert_eq!(Payload::parse(""), Payload::Empty);
        assert_eq!(Payload::parse("{\"a\":1}"), Payload::Json(json!({"a": 1})));
        assert_eq!(Payload::parse("oops"), Payload::Text("oops".to_string()));
    }

    #[test]
    fn error_message_prefers_detail_then_error() {
        let p = Payload::Json(json!({"detail": "not found", "error": "x"}));
        assert_eq!(error_message(404, "Not Found", &p), "not found");

        let p = Payload::Json(json!({"error": "unknown provider"}));
        assert_eq!(error_message(400, "Bad Request", &p), "unknown provider");
    }

    #[test]
    fn error_message_falls_back_to_status_text() {
        let p = Payload::Text("oops".to_string());
        assert_eq!(error_message(500, "Internal Server Error", &p), "Internal Server Error");
        assert_eq!(error_message(502, "", &Payload::Empty), "HTTP 502");
    }

    #[test]
    fn error_message_uses_other_structured_payloads() {
        let p = Payload::Json(json!("vault locked"));
        assert_eq!(error_message(403, "Forbidden", &p), "vault locked");

        let p = Payload::Json(json!({"code": 7}));
        assert_eq!(error_message(409, "Conflict", &p), r#"{"code":7}"#);
    }

    #[test]
    fn api_error_displays_message_only() {
        let err = ApiError::http(404, "Not Found", "not found");
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status_line(), "404 Not Found");
        let down = ApiError::transport("refused");
        assert_eq!(down.status, None);
        assert_eq!(down.status_line(), "unreachable");
    }
}
