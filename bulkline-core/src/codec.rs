use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::request::WireRequest;
use crate::response::WireResponse;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("failed to encode batch payload: {0}")]
    Encode(String),
    #[error("failed to decode response record {index}: {reason}")]
    Decode { index: usize, reason: String },
}

impl CodecError {
    pub fn decode(index: usize, reason: impl ToString) -> Self {
        CodecError::Decode {
            index,
            reason: reason.to_string(),
        }
    }
}

/// Default outgoing serialization: a JSON array of wire requests.
pub fn default_to_json(requests: &[WireRequest]) -> Result<String, CodecError> {
    serde_json::to_string(requests).map_err(|e| CodecError::Encode(e.to_string()))
}

#[derive(Deserialize)]
struct RawRecord {
    status: u16,
    #[serde(default)]
    body: Option<Value>,
}

/// Default combined-response parsing: newline-separated JSON objects,
/// blank lines skipped. Each record's `body` is a JSON-encoded string
/// which is decoded a second time; decode failures propagate.
pub fn default_parse(payload: &str) -> Result<Vec<WireResponse>, CodecError> {
    let mut responses = Vec::new();
    for line in payload.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let index = responses.len();
        let raw: RawRecord =
            serde_json::from_str(line).map_err(|e| CodecError::decode(index, e))?;
        let body = match raw.body {
            Some(Value::String(text)) if !text.is_empty() => {
                Some(serde_json::from_str(&text).map_err(|e| CodecError::decode(index, e))?)
            }
            other => other,
        };
        responses.push(WireResponse {
            status: raw.status,
            body,
        });
    }
    Ok(responses)
}
