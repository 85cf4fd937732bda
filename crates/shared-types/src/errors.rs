//! Error types for the entity codec.

use thiserror::Error;

/// Decoding failures for the fixed-layout codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input had the wrong length for the expected layout.
    #[error("{kind} encoding must be {expected} bytes, got {actual}")]
    Length {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },
}
