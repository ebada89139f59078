// BulkClient: the request-dispatch facade.
// Every outgoing request goes through `dispatch`, which decorates the
// underlying transport: while a batch collection scope is active the
// request is diverted into the active tree's ledger instead of being
// sent; otherwise it passes through unchanged.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, trace};

use bulkline_core::{
    normalize, BatchOverrides, BatchSettings, RequestHandle, RequestSettings, StatusLabel,
};
use bulkline_transport::{Transport, TransportRequest};

use crate::batch::Batch;
use crate::context::CaptureContext;
use crate::ledger::LedgerEntry;

pub struct BulkClient {
    transport: Arc<dyn Transport>,
    settings: RwLock<BatchSettings>,
    context: Arc<CaptureContext>,
}

impl BulkClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_settings(transport, BatchSettings::default())
    }

    pub fn with_settings(transport: Arc<dyn Transport>, settings: BatchSettings) -> Self {
        BulkClient {
            transport,
            settings: RwLock::new(settings),
            context: Arc::new(CaptureContext::new()),
        }
    }

    /// Mutates the client-wide batch settings. Batches snapshot settings
    /// at construction, so existing batches are unaffected.
    pub fn setup(&self, configure: impl FnOnce(&mut BatchSettings)) {
        let mut guard = self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        configure(&mut guard);
    }

    /// Snapshot of the current client-wide settings.
    pub fn settings(&self) -> BatchSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Creates a batch from the current settings snapshot.
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(self, BatchOverrides::default())
    }

    /// Creates a batch with per-instance settings overrides.
    pub fn batch_with(&self, overrides: BatchOverrides) -> Batch<'_> {
        Batch::new(self, overrides)
    }

    /// Creates a batch and immediately collects requests with `collect`.
    pub fn collect(&self, collect: impl FnOnce()) -> Batch<'_> {
        self.collect_with(BatchOverrides::default(), collect)
    }

    /// Creates a batch with overrides and immediately collects requests.
    pub fn collect_with(&self, overrides: BatchOverrides, collect: impl FnOnce()) -> Batch<'_> {
        let mut batch = self.batch_with(overrides);
        batch.add(collect);
        batch
    }

    /// Dispatches one request.
    ///
    /// The handle is returned synchronously in every case. A captured
    /// request's handle resolves only through batch delivery; a
    /// passthrough request is spawned on the ambient Tokio runtime and
    /// completes via its own callbacks (so dispatching outside a batch
    /// scope requires a runtime).
    pub fn dispatch(&self, mut settings: RequestSettings) -> Arc<RequestHandle> {
        let handle = Arc::new(RequestHandle::new());

        // The caller's pre-send hook runs first; explicit cancellation
        // takes precedence over batching.
        if let Some(mut hook) = settings.before_send.take() {
            if !hook(&handle, &settings) {
                trace!(url = %settings.url, "request cancelled by before_send hook");
                handle.mark_cancelled();
                return handle;
            }
            settings.before_send = Some(hook);
        }

        if let Some(shared) = self.context.current() {
            let serialize = self
                .settings
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .serialize
                .clone();
            let request = (serialize)(normalize(&settings), &handle, &settings);
            trace!(method = %settings.method, url = %settings.url, "request captured into active batch");
            handle.mark_captured();
            shared.push_entry(LedgerEntry {
                handle: Arc::clone(&handle),
                settings,
                request,
            });
            return handle;
        }

        trace!(method = %settings.method, url = %settings.url, "no batch scope active, passing request through");
        let transport = Arc::clone(&self.transport);
        let passthrough_handle = Arc::clone(&handle);
        tokio::spawn(async move {
            passthrough(transport, settings, passthrough_handle).await;
        });
        handle
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    pub(crate) fn context(&self) -> &CaptureContext {
        &self.context
    }
}

impl fmt::Debug for BulkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkClient")
            .field("settings", &self.settings())
            .finish_non_exhaustive()
    }
}

async fn passthrough(
    transport: Arc<dyn Transport>,
    mut settings: RequestSettings,
    handle: Arc<RequestHandle>,
) {
    let mut request = TransportRequest::new(settings.method.clone(), settings.url.clone());
    request.content_type = settings.content_type.clone();
    request.headers = settings.headers.clone();
    request.body = settings.data.clone();

    match transport.execute(request).await {
        Ok(response) => {
            let label = StatusLabel::from_status(response.status);
            handle.complete(response.status, label);
            let callback = if label.is_error() {
                settings.error.take()
            } else {
                settings.success.take()
            };
            if let Some(callback) = callback {
                callback(decode_body(&response.body), label, &handle);
            }
        }
        Err(err) => {
            debug!(error = %err, url = %settings.url, "passthrough request failed");
            // Status 0: the request never reached the HTTP layer.
            handle.complete(0, StatusLabel::Error);
            if let Some(callback) = settings.error.take() {
                callback(Value::String(err.to_string()), StatusLabel::Error, &handle);
            }
        }
    }
}

fn decode_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
