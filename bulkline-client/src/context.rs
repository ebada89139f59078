use std::sync::{Arc, Mutex, PoisonError};

use crate::ledger::BatchShared;

/// The "collection scope is active" marker, held per client rather than
/// process-wide so interception stays instance-scoped and testable.
///
/// While set, every request dispatched through the owning client is
/// diverted into the marked batch tree's ledger. Entered before the
/// user's collection closure runs and exited afterwards, by the batch
/// that owns the scope (a nested batch never clears its ancestor's
/// marker). Overlapping scopes from concurrent tasks sharing one client
/// are outside the design: collection is synchronous.
#[derive(Default)]
pub(crate) struct CaptureContext {
    active: Mutex<Option<Arc<BatchShared>>>,
}

impl CaptureContext {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&self, shared: Arc<BatchShared>) {
        *self.lock() = Some(shared);
    }

    pub(crate) fn exit(&self) {
        *self.lock() = None;
    }

    pub(crate) fn current(&self) -> Option<Arc<BatchShared>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<BatchShared>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
