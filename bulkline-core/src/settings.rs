use std::fmt;
use std::sync::Arc;

use crate::codec::{self, CodecError};
use crate::handle::RequestHandle;
use crate::request::{RequestSettings, WireRequest};
use crate::response::WireResponse;

/// Per-request transform applied after normalization, before storage in
/// the ledger. Receives the handle and original settings of the captured
/// request.
pub type SerializeHook =
    Arc<dyn Fn(WireRequest, &RequestHandle, &RequestSettings) -> WireRequest + Send + Sync>;

/// Serializes the full request list for the wire.
pub type ToJsonHook = Arc<dyn Fn(&[WireRequest]) -> Result<String, CodecError> + Send + Sync>;

/// Parses a combined response payload into discrete response records.
pub type ParseHook = Arc<dyn Fn(&str) -> Result<Vec<WireResponse>, CodecError> + Send + Sync>;

/// How the combined call's response body is to be consumed. Drives the
/// Accept header of the outer request; the engine always hands the raw
/// text to the parse hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Text,
    Json,
}

impl DataType {
    pub fn accept(&self) -> &'static str {
        match self {
            DataType::Text => "text/plain, */*; q=0.01",
            DataType::Json => "application/json, text/javascript, */*; q=0.01",
        }
    }
}

/// Batch configuration. Held process-wide by the client and mutable at
/// any time; every batch snapshots the current value at construction.
#[derive(Clone)]
pub struct BatchSettings {
    /// Bulk endpoint for the combined call.
    pub url: String,
    pub method: String,
    pub content_type: String,
    /// When true and the combined call is a GET, the payload is appended
    /// to the URL as a query string instead of being sent as the body.
    pub process_data: bool,
    pub data_type: DataType,
    pub serialize: SerializeHook,
    pub to_json: ToJsonHook,
    pub parse: ParseHook,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            url: "/_bulk".to_string(),
            method: "POST".to_string(),
            content_type: "application/json".to_string(),
            process_data: false,
            data_type: DataType::Text,
            serialize: Arc::new(
                |request: WireRequest, _: &RequestHandle, _: &RequestSettings| request,
            ),
            to_json: Arc::new(|requests: &[WireRequest]| codec::default_to_json(requests)),
            parse: Arc::new(|payload: &str| codec::default_parse(payload)),
        }
    }
}

impl BatchSettings {
    /// Applies per-instance overrides onto a settings snapshot.
    pub fn merged(mut self, overrides: BatchOverrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if let Some(content_type) = overrides.content_type {
            self.content_type = content_type;
        }
        if let Some(process_data) = overrides.process_data {
            self.process_data = process_data;
        }
        if let Some(data_type) = overrides.data_type {
            self.data_type = data_type;
        }
        if let Some(to_json) = overrides.to_json {
            self.to_json = to_json;
        }
        if let Some(parse) = overrides.parse {
            self.parse = parse;
        }
        self
    }
}

impl fmt::Debug for BatchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSettings")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("process_data", &self.process_data)
            .field("data_type", &self.data_type)
            .finish_non_exhaustive()
    }
}

/// Per-instance settings overrides, supplied at batch construction.
#[derive(Default)]
pub struct BatchOverrides {
    pub url: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<String>,
    pub process_data: Option<bool>,
    pub data_type: Option<DataType>,
    pub to_json: Option<ToJsonHook>,
    pub parse: Option<ParseHook>,
}

impl BatchOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn process_data(mut self, process_data: bool) -> Self {
        self.process_data = Some(process_data);
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn to_json(mut self, hook: ToJsonHook) -> Self {
        self.to_json = Some(hook);
        self
    }

    pub fn parse(mut self, hook: ParseHook) -> Self {
        self.parse = Some(hook);
        self
    }
}

impl fmt::Debug for BatchOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOverrides")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
