//! Outgoing request description

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::{Error, Result};

/// JSON content type used for mutating calls.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// One HTTP call, built fresh per dispatch.
///
/// `path` is relative to whatever endpoint the dispatching connection targets;
/// an [`AuthConnection`](crate::AuthConnection) prefixes it with the discovered
/// service path.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Action path, starting with `/` (or empty for the endpoint root).
    pub path: String,
    /// Query parameters in insertion order.
    pub params: Vec<(String, String)>,
    /// Headers overriding the connection defaults.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Leave the response body unread for streaming.
    pub raw: bool,
}

impl Request {
    /// Request with no params, headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            raw: false,
        }
    }

    /// `GET path`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `HEAD path`
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// `POST path`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `DELETE path`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the JSON content type.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::Configuration(format!("Failed to serialize request body: {e}")))?;
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    /// Stream the response body instead of buffering it.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    /// Whether a parameter with `key` is already present.
    pub fn has_param(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_body_sets_content_type() {
        let req = Request::post("/domains")
            .json(&json!({"domains": [{"name": "example.com"}]}))
            .unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(
            req.headers.get(CONTENT_TYPE).unwrap(),
            "application/json; charset=UTF-8"
        );
        let body: serde_json::Value = serde_json::from_slice(&req.body.unwrap()).unwrap();
        assert_eq!(body["domains"][0]["name"], "example.com");
    }

    #[test]
    fn params_keep_insertion_order() {
        let req = Request::get("/status/1")
            .param("showDetails", "true")
            .param("format", "json");
        assert_eq!(
            req.params,
            vec![
                ("showDetails".to_string(), "true".to_string()),
                ("format".to_string(), "json".to_string())
            ]
        );
        assert!(req.has_param("format"));
        assert!(!req.has_param("marker"));
    }

    #[test]
    fn raw_flag_defaults_off() {
        assert!(!Request::get("/c/o").raw);
        assert!(Request::get("/c/o").raw().raw);
    }
}
