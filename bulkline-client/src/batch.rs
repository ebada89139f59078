use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use bulkline_core::{
    BatchOverrides, BatchSettings, BulkCallback, BulkReply, StatusLabel, WireRequest,
};
use bulkline_transport::{TransportError, TransportRequest};

use crate::client::BulkClient;
use crate::demux;
use crate::error::BatchError;
use crate::ledger::BatchShared;

/// Per-send overrides for the combined call.
#[derive(Default)]
pub struct SendOptions {
    pub url: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<String>,
    /// Explicit payload; suppresses `to_json` serialization when set.
    pub data: Option<String>,
    pub success: Option<BulkCallback>,
}

impl SendOptions {
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

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn on_success(mut self, callback: impl FnOnce(&BulkReply) + Send + 'static) -> Self {
        self.success = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SendOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("data", &self.data)
            .field("success", &self.success.is_some())
            .finish_non_exhaustive()
    }
}

/// How a `send` resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The combined call completed and its response was delivered.
    Sent(BulkReply),
    /// A child batch chained its success callback onto an ancestor; the
    /// actual send happens whenever the ancestor is sent.
    Deferred,
    /// No captured requests; no call was issued.
    Empty,
}

/// One collection scope.
///
/// Requests dispatched through the owning client while `add` runs are
/// captured into this batch's ledger — or, when this batch was
/// constructed inside another batch's collection scope, into that
/// ancestor's ledger, so the whole nested tree accumulates in one place
/// and is sent with a single combined call.
pub struct Batch<'a> {
    client: &'a BulkClient,
    options: BatchSettings,
    shared: Arc<BatchShared>,
    parent: Option<Weak<BatchShared>>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(client: &'a BulkClient, overrides: BatchOverrides) -> Self {
        let options = client.settings().merged(overrides);
        let parent = client
            .context()
            .current()
            .map(|shared| Arc::downgrade(&shared));
        Batch {
            client,
            options,
            shared: Arc::new(BatchShared::new()),
            parent,
        }
    }

    /// Number of requests captured into this batch's own ledger. Zero
    /// for a nested batch: its captures are attributed to the ancestor.
    pub fn len(&self) -> usize {
        self.shared.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized wire records captured so far, in capture order.
    pub fn requests(&self) -> Vec<WireRequest> {
        self.shared.wire_requests()
    }

    /// Runs `collect`, capturing every request it dispatches through the
    /// owning client. Capture is synchronous; when `collect` returns,
    /// all its requests are in the ledger. A batch with a parent leaves
    /// the ancestor's scope marker in place.
    pub fn add(&mut self, collect: impl FnOnce()) -> &mut Self {
        let target = self
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .unwrap_or_else(|| Arc::clone(&self.shared));
        self.client.context().enter(target);
        collect();
        if self.parent.is_none() {
            self.client.context().exit();
        }
        self
    }

    /// Sends the batch.
    ///
    /// A child batch given a success callback defers: the callback is
    /// chained onto the root's completion listeners and no network call
    /// is made. Otherwise the ledger is serialized and issued as exactly
    /// one combined call; on response, each record is delivered to its
    /// originating callback, then chained listeners run in registration
    /// order, then `options.success`.
    pub async fn send(self, options: SendOptions) -> Result<SendOutcome, BatchError> {
        let SendOptions {
            url,
            method,
            content_type,
            data,
            success,
        } = options;

        if let Some(parent) = self.parent.as_ref().and_then(Weak::upgrade) {
            if let Some(success) = success {
                trace!("child batch chaining success onto ancestor");
                parent.push_listener(success);
                return Ok(SendOutcome::Deferred);
            }
        }

        let entries = self.shared.take_entries();
        if entries.is_empty() {
            trace!("batch has no captured requests, nothing to send");
            return Ok(SendOutcome::Empty);
        }

        let requests: Vec<WireRequest> = entries.iter().map(|e| e.request.clone()).collect();
        let payload = match data {
            Some(data) => data,
            None => (self.options.to_json)(&requests)?,
        };

        let url = url.unwrap_or_else(|| self.options.url.clone());
        let method = method.unwrap_or_else(|| self.options.method.clone());
        let content_type = content_type.unwrap_or_else(|| self.options.content_type.clone());

        // GET with process_data moves the payload into the query string.
        let (url, body) = if self.options.process_data && method.eq_ignore_ascii_case("GET") {
            let sep = if url.contains('?') { '&' } else { '?' };
            (format!("{url}{sep}{payload}"), None)
        } else {
            (url, Some(payload))
        };

        debug!(entries = entries.len(), %url, "sending combined batch request");
        let mut request = TransportRequest::new(method, url);
        request.content_type = Some(content_type);
        request.headers.push((
            "accept".to_string(),
            self.options.data_type.accept().to_string(),
        ));
        if let Some(body) = &body {
            trace!(payload = %body, "combined request payload");
        }
        request.body = body;

        let response = self.client.transport().execute(request).await?;
        if StatusLabel::from_status(response.status).is_error() {
            return Err(TransportError::Status {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let records = (self.options.parse)(&response.body)?;
        let dispatched = demux::deliver(entries, records);
        debug!(dispatched, "combined response delivered");

        let reply = BulkReply {
            status: response.status,
            body: response.body,
        };
        for listener in self.shared.take_listeners() {
            listener(&reply);
        }
        if let Some(success) = success {
            success(&reply);
        }

        Ok(SendOutcome::Sent(reply))
    }
}

impl fmt::Debug for Batch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("options", &self.options)
            .field("len", &self.len())
            .field("nested", &self.parent.is_some())
            .finish_non_exhaustive()
    }
}
