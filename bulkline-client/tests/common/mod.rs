#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bulkline_client::{Transport, TransportError, TransportRequest, TransportResponse};

/// Records every executed request and answers from a queue of canned
/// responses (empty 200 once the queue runs dry).
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportRequest>>,
    responses: Mutex<VecDeque<TransportResponse>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingTransport {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        })
    }

    pub fn with_response(status: u16, body: impl Into<String>) -> Arc<Self> {
        let transport = Self::new();
        transport.push_response(status, body);
        transport
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(TransportResponse {
            status,
            body: body.into(),
        });
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TransportResponse {
                status: 200,
                body: String::new(),
            }))
    }
}

/// Builds one line of the default bulk wire format: a JSON object whose
/// `body` field is itself a JSON-encoded string.
pub fn bulk_line(status: u16, body: &serde_json::Value) -> String {
    serde_json::json!({ "status": status, "body": body.to_string() }).to_string()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bulkline=trace")),
        )
        .try_init();
}
