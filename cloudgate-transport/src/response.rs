//! Received response and body classification

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::stream::ChunkStream;
use crate::utils::log_sanitizer::truncate_bytes_for_log;

/// Body decoded according to the declared content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// No body (e.g. `204 No Content`, `HEAD`).
    Empty,
    /// `application/json` or `*+json`.
    Json(Value),
    /// Anything else, decoded lossily as UTF-8.
    Text(String),
}

/// Error details a provider embedded in a failure body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Provider error code, if one was given.
    pub code: Option<String>,
    /// Human readable message.
    pub message: String,
    /// Extra detail string.
    pub details: Option<String>,
}

impl ApiError {
    /// Recognize the error shapes used by Rackspace and OpenStack APIs:
    ///
    /// - `{"code": 400, "message": "...", "details": "..."}`
    /// - `{"validationErrors": {"messages": ["...", "..."]}}`
    /// - `{"itemNotFound": {"code": 404, "message": "..."}}` (single wrapping key)
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        if let Some(message) = obj.get("message").and_then(Value::as_str) {
            return Some(Self {
                code: obj.get("code").and_then(value_to_string),
                message: message.to_string(),
                details: obj.get("details").and_then(value_to_string),
            });
        }

        if let Some(messages) = obj
            .get("validationErrors")
            .and_then(|v| v.get("messages"))
            .and_then(Value::as_array)
        {
            let joined = messages
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Some(Self {
                code: None,
                message: format!("Validation errors: {joined}"),
                details: None,
            });
        }

        if obj.len() == 1
            && let Some((kind, inner)) = obj.iter().next()
            && let Some(message) = inner.get("message").and_then(Value::as_str)
        {
            return Some(Self {
                code: inner
                    .get("code")
                    .and_then(value_to_string)
                    .or_else(|| Some(kind.clone())),
                message: message.to_string(),
                details: inner.get("details").and_then(value_to_string),
            });
        }

        None
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.details) {
            (Some(code), Some(details)) => write!(f, "{code} - {} ({details})", self.message),
            (Some(code), None) => write!(f, "{code} - {}", self.message),
            (None, Some(details)) => write!(f, "{} ({details})", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx.
    Success,
    /// Non-2xx without a recognizable error body.
    Failure,
    /// Non-2xx carrying a provider error body.
    StructuredError(ApiError),
}

/// An HTTP response.
///
/// Immutable once received. The parsed body is computed on first access and
/// cached. Raw responses keep the body on the wire until
/// [`into_chunks`](Self::into_chunks) hands it to a [`ChunkStream`].
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    pending: Option<reqwest::Response>,
    parsed: OnceLock<std::result::Result<ParsedBody, String>>,
}

impl Response {
    /// Buffered response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            pending: None,
            parsed: OnceLock::new(),
        }
    }

    /// Buffered response with a JSON body and content type.
    pub fn from_json(status: StatusCode, value: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::new(status, headers, value.to_string())
    }

    /// Response whose body has not been read.
    pub(crate) fn streaming(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: Bytes::new(),
            pending: Some(response),
            parsed: OnceLock::new(),
        }
    }

    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// All headers (case-insensitive lookup).
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes. Empty for raw responses.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded lossily as UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether the body is still unread on the wire.
    pub fn is_raw(&self) -> bool {
        self.pending.is_some()
    }

    /// Declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// Body decoded per content type, computed once.
    ///
    /// A body declared as JSON that fails to parse is a
    /// [`MalformedResponse`](Error::MalformedResponse).
    pub fn parsed(&self) -> Result<&ParsedBody> {
        self.parsed
            .get_or_init(|| parse_body(self.content_type(), &self.body))
            .as_ref()
            .map_err(|e| Error::MalformedResponse(e.clone()))
    }

    /// Deserialize the body as JSON regardless of the declared content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            log::error!("JSON parse failed: {e}");
            log::error!("Raw response: {}", truncate_bytes_for_log(&self.body));
            Error::MalformedResponse(format!("Failed to parse JSON body: {e}"))
        })
    }

    /// Classify the status, extracting a provider error body when present.
    pub fn classify(&self) -> Outcome {
        if self.status.is_success() {
            return Outcome::Success;
        }
        match self.parsed() {
            Ok(ParsedBody::Json(value)) => {
                ApiError::from_value(value).map_or(Outcome::Failure, Outcome::StructuredError)
            }
            _ => Outcome::Failure,
        }
    }

    /// Hand the body to a chunk reader yielding pieces of `chunk_size` bytes.
    pub fn into_chunks(self, chunk_size: usize) -> ChunkStream {
        match self.pending {
            Some(response) => ChunkStream::from_response(response, chunk_size),
            None => ChunkStream::from_bytes(self.body, chunk_size),
        }
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

fn parse_body(content_type: Option<&str>, body: &[u8]) -> std::result::Result<ParsedBody, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ParsedBody::Empty);
    }
    if content_type.is_some_and(is_json_content_type) {
        return serde_json::from_slice(body)
            .map(ParsedBody::Json)
            .map_err(|e| format!("Failed to parse JSON body: {e}"));
    }
    Ok(ParsedBody::Text(String::from_utf8_lossy(body).into_owned()))
}
