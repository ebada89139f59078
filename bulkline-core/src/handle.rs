use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::response::StatusLabel;

/// Where a dispatched request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    /// Handed to the dispatcher, outcome not yet known.
    #[default]
    Pending,
    /// Diverted into an active batch; resolves only through delivery.
    Captured,
    /// Cancelled by a `before_send` hook before any capture or I/O.
    Cancelled,
    /// A status has been attached and callbacks (if any) have run.
    Completed,
}

/// Per-request completion carrier, returned synchronously from dispatch.
///
/// For a captured request no transport machinery ever touches this handle;
/// the demultiplexer attaches the synthetic status from the combined
/// response and invokes the original callback bound to it.
#[derive(Debug, Default)]
pub struct RequestHandle {
    inner: Mutex<HandleInner>,
}

#[derive(Debug, Default)]
struct HandleInner {
    state: DispatchState,
    status: Option<u16>,
    label: Option<StatusLabel>,
}

impl RequestHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatchState {
        self.lock().state
    }

    pub fn status(&self) -> Option<u16> {
        self.lock().status
    }

    pub fn label(&self) -> Option<StatusLabel> {
        self.lock().label
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == DispatchState::Cancelled
    }

    /// Marks the request as diverted into a batch ledger.
    pub fn mark_captured(&self) {
        self.lock().state = DispatchState::Captured;
    }

    /// Marks the request as cancelled before dispatch.
    pub fn mark_cancelled(&self) {
        self.lock().state = DispatchState::Cancelled;
    }

    /// Attaches the final status and classification to the handle.
    pub fn complete(&self, status: u16, label: StatusLabel) {
        let mut inner = self.lock();
        inner.state = DispatchState::Completed;
        inner.status = Some(status);
        inner.label = Some(label);
    }

    fn lock(&self) -> MutexGuard<'_, HandleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
