//! Storage error types.

use shared_types::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O or corruption; the message comes from the adapter.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The tip pointer has never been written (pre-genesis store).
    #[error("tip hash is not set")]
    TipUnset,

    /// A persisted value failed to decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
