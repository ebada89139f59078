use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bulkline_core::{BulkCallback, RequestHandle, RequestSettings, WireRequest};

/// One captured request: the synthetic completion handle, the caller's
/// original settings (callbacks live here), and the normalized wire
/// record.
pub struct LedgerEntry {
    pub handle: Arc<RequestHandle>,
    pub settings: RequestSettings,
    pub request: WireRequest,
}

impl std::fmt::Debug for LedgerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEntry")
            .field("handle", &self.handle)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

/// Append-only store of captured requests for one batch tree. Insertion
/// order is the only correlation key with the combined response.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> Vec<LedgerEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn wire_requests(&self) -> Vec<WireRequest> {
        self.entries.iter().map(|e| e.request.clone()).collect()
    }
}

/// State shared across a batch tree: the root's ledger plus the ordered
/// list of completion listeners chained by child batches.
#[derive(Default)]
pub(crate) struct BatchShared {
    ledger: Mutex<Ledger>,
    listeners: Mutex<Vec<BulkCallback>>,
}

impl BatchShared {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_entry(&self, entry: LedgerEntry) {
        self.lock_ledger().push(entry);
    }

    pub(crate) fn entry_count(&self) -> usize {
        self.lock_ledger().len()
    }

    pub(crate) fn take_entries(&self) -> Vec<LedgerEntry> {
        self.lock_ledger().drain()
    }

    pub(crate) fn wire_requests(&self) -> Vec<WireRequest> {
        self.lock_ledger().wire_requests()
    }

    /// Chains a completion listener; listeners run in registration order
    /// at delivery, before the send caller's own success callback.
    pub(crate) fn push_listener(&self, listener: BulkCallback) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub(crate) fn take_listeners(&self) -> Vec<BulkCallback> {
        std::mem::take(
            &mut *self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn lock_ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkline_core::normalize;

    fn entry(url: &str) -> LedgerEntry {
        let settings = RequestSettings::get(url);
        let request = normalize(&settings);
        LedgerEntry {
            handle: Arc::new(RequestHandle::new()),
            settings,
            request,
        }
    }

    #[test]
    fn test_ledger_preserves_insertion_order() {
        let mut ledger = Ledger::default();
        ledger.push(entry("/a"));
        ledger.push(entry("/b"));
        assert_eq!(ledger.len(), 2);

        let entries = ledger.drain();
        assert_eq!(entries[0].request.path, "/a");
        assert_eq!(entries[1].request.path, "/b");
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_shared_listeners_drain_in_registration_order() {
        let shared = BatchShared::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = order.clone();
            shared.push_listener(Box::new(move |_reply| {
                order.lock().unwrap().push(tag);
            }));
        }

        let reply = bulkline_core::BulkReply {
            status: 200,
            body: String::new(),
        };
        for listener in shared.take_listeners() {
            listener(&reply);
        }
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert!(shared.take_listeners().is_empty());
    }
}
