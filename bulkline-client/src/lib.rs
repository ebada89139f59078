// bulkline client
// Collects individual HTTP requests issued while a batch scope is active,
// sends them as one combined call to a bulk endpoint, and demultiplexes
// the combined response back to each request's success/error callback.

pub mod batch;
pub mod client;
pub mod error;
pub mod ledger;

mod context;
mod demux;

pub use batch::{Batch, SendOptions, SendOutcome};
pub use client::BulkClient;
pub use error::BatchError;
pub use ledger::{Ledger, LedgerEntry};

pub use bulkline_core::{
    normalize, BatchOverrides, BatchSettings, BulkCallback, BulkReply, Callback, CodecError,
    DataType, DispatchState, Outcome, RequestHandle, RequestSettings, StatusLabel, WireRequest,
    WireResponse,
};
pub use bulkline_transport::{
    HttpTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
