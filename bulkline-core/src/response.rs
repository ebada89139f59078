use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One demultiplexed record of a combined response, aligned positionally
/// with the ledger entry at the same index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Classification of an inner response status.
///
/// 304 is a distinguished success variant: its label differs from generic
/// success but it routes to the success callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Success,
    NotModified,
    Error,
}

impl StatusLabel {
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            StatusLabel::Success
        } else if status == 304 {
            StatusLabel::NotModified
        } else {
            StatusLabel::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Success => "success",
            StatusLabel::NotModified => "notmodified",
            StatusLabel::Error => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusLabel::Error)
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged per-request outcome, dispatched by match rather than by dynamic
/// callback-name lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { body: Value },
    Error { body: Value },
}

impl Outcome {
    pub fn body(self) -> Value {
        match self {
            Outcome::Success { body } | Outcome::Error { body } => body,
        }
    }
}

impl From<WireResponse> for Outcome {
    fn from(response: WireResponse) -> Self {
        let body = response.body.unwrap_or(Value::Null);
        match StatusLabel::from_status(response.status) {
            StatusLabel::Error => Outcome::Error { body },
            _ => Outcome::Success { body },
        }
    }
}

/// Outcome of the single combined call, handed to chained completion
/// listeners and the send caller's success callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReply {
    pub status: u16,
    /// Raw combined payload, exactly as the transport returned it.
    pub body: String,
}

/// Completion listener for the combined call.
pub type BulkCallback = Box<dyn FnOnce(&BulkReply) + Send>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_classification() {
        assert_eq!(StatusLabel::from_status(200), StatusLabel::Success);
        assert_eq!(StatusLabel::from_status(204), StatusLabel::Success);
        assert_eq!(StatusLabel::from_status(299), StatusLabel::Success);
        assert_eq!(StatusLabel::from_status(304), StatusLabel::NotModified);
        assert_eq!(StatusLabel::from_status(300), StatusLabel::Error);
        assert_eq!(StatusLabel::from_status(404), StatusLabel::Error);
        assert_eq!(StatusLabel::from_status(500), StatusLabel::Error);
    }

    #[test]
    fn test_labels() {
        assert_eq!(StatusLabel::Success.as_str(), "success");
        assert_eq!(StatusLabel::NotModified.as_str(), "notmodified");
        assert_eq!(StatusLabel::Error.as_str(), "error");
        assert!(StatusLabel::Error.is_error());
        assert!(!StatusLabel::NotModified.is_error());
    }

    #[test]
    fn test_outcome_from_response() {
        let ok = Outcome::from(WireResponse {
            status: 200,
            body: Some(json!({"id": 1})),
        });
        assert_eq!(
            ok,
            Outcome::Success {
                body: json!({"id": 1})
            }
        );

        let err = Outcome::from(WireResponse {
            status: 500,
            body: Some(json!({"error": 1})),
        });
        assert_eq!(
            err,
            Outcome::Error {
                body: json!({"error": 1})
            }
        );
    }

    #[test]
    fn test_not_modified_is_a_success_outcome() {
        let outcome = Outcome::from(WireResponse {
            status: 304,
            body: None,
        });
        assert_eq!(outcome, Outcome::Success { body: Value::Null });
    }

    #[test]
    fn test_missing_body_becomes_null() {
        let outcome = Outcome::from(WireResponse {
            status: 500,
            body: None,
        });
        assert_eq!(outcome.body(), Value::Null);
    }
}
