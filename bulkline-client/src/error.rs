use thiserror::Error;

use bulkline_core::CodecError;
use bulkline_transport::TransportError;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
