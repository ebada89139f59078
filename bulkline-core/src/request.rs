use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::handle::RequestHandle;
use crate::response::StatusLabel;

/// Canonical record of one captured request, in the shape the bulk
/// endpoint consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub method: String,
    /// Request target with any query string stripped.
    pub path: String,
    /// Lowercase header names. The bulk endpoint strips the outer
    /// request's content-type for each inner request, so it is always
    /// set here explicitly when the caller provided one.
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Present only when the original URL carried a query string: the
    /// caller's explicit query object if given, else the raw query
    /// string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
}

/// Per-request completion callback: `(body, label, handle)`.
pub type Callback = Box<dyn FnOnce(Value, StatusLabel, &RequestHandle) + Send>;

/// Pre-dispatch hook. Returning `false` cancels the request outright,
/// taking precedence over batching.
pub type BeforeSend = Box<dyn FnMut(&RequestHandle, &RequestSettings) -> bool + Send>;

/// Caller-facing description of a single outgoing request.
pub struct RequestSettings {
    pub method: String,
    pub url: String,
    /// Pre-serialized body (form-encoded, JSON text, ...), passed through
    /// unmodified.
    pub data: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Explicit query object; preferred over the raw query string when
    /// the URL carries one.
    pub query: Option<Value>,
    pub before_send: Option<BeforeSend>,
    pub success: Option<Callback>,
    pub error: Option<Callback>,
}

impl RequestSettings {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        RequestSettings {
            method: method.into(),
            url: url.into(),
            data: None,
            content_type: None,
            headers: Vec::new(),
            query: None,
            before_send: None,
            success: None,
            error: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new("PUT", url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new("DELETE", url)
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn before_send(
        mut self,
        hook: impl FnMut(&RequestHandle, &RequestSettings) -> bool + Send + 'static,
    ) -> Self {
        self.before_send = Some(Box::new(hook));
        self
    }

    pub fn on_success(
        mut self,
        callback: impl FnOnce(Value, StatusLabel, &RequestHandle) + Send + 'static,
    ) -> Self {
        self.success = Some(Box::new(callback));
        self
    }

    pub fn on_error(
        mut self,
        callback: impl FnOnce(Value, StatusLabel, &RequestHandle) + Send + 'static,
    ) -> Self {
        self.error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for RequestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSettings")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("data", &self.data)
            .field("content_type", &self.content_type)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("success", &self.success.is_some())
            .field("error", &self.error.is_some())
            .finish_non_exhaustive()
    }
}

/// Produces the canonical wire record for one captured request.
pub fn normalize(settings: &RequestSettings) -> WireRequest {
    let (path, raw_query) = split_query(&settings.url);

    let mut headers = BTreeMap::new();
    if let Some(content_type) = &settings.content_type {
        headers.insert("content-type".to_string(), content_type.clone());
    }
    for (name, value) in &settings.headers {
        let lowered = name.to_lowercase();
        // An empty lowercased name falls back to the original.
        let key = if lowered.is_empty() { name.clone() } else { lowered };
        headers.insert(key, value.clone());
    }

    let query = raw_query.map(|raw| {
        settings
            .query
            .clone()
            .unwrap_or_else(|| Value::String(raw.to_string()))
    });

    WireRequest {
        method: settings.method.clone(),
        path,
        headers,
        body: settings.data.clone(),
        query,
    }
}

/// Splits a URL at the last `?`. An empty trailing query string does not
/// count as one.
fn split_query(url: &str) -> (String, Option<&str>) {
    match url.rfind('?') {
        Some(pos) if pos + 1 < url.len() => (url[..pos].to_string(), Some(&url[pos + 1..])),
        _ => (url.to_string(), None),
    }
}
