//! # Wire Framing
//!
//! Frame codec for the two custom peer protocols (block fetch and tip
//! fetch): a 4-byte big-endian length prefix followed by a JSON body, no
//! newline delimiters anywhere. The transport that carries the frames is
//! out of scope; this module is pure bytes-in/bytes-out.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Block, Hash};
use thiserror::Error;

/// Upper bound on a frame body; a block response is well under this.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame body of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),

    #[error("malformed frame body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request one block by its identity hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRequest {
    /// Hex-encoded 32-byte hash.
    pub hash: String,
}

impl BlockRequest {
    pub fn new(hash: &Hash) -> Self {
        Self {
            hash: hex::encode(hash),
        }
    }

    pub fn hash_bytes(&self) -> Option<Hash> {
        let bytes = hex::decode(&self.hash).ok()?;
        bytes.try_into().ok()
    }
}

/// Request the peer's canonical tip. No parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TipRequest {}

/// Response to either request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockResponse {
    pub fn found(block: Block) -> Self {
        Self {
            block: Some(block),
            error: None,
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self {
            block: None,
            error: Some(reason.into()),
        }
    }
}

/// Encode one message as a length-prefixed frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Try to decode one frame from the front of `buf`.
///
/// Returns the message and the number of bytes consumed, or `Ok(None)` when
/// the buffer does not yet hold a complete frame.
pub fn decode_frame<T: DeserializeOwned>(buf: &[u8]) -> Result<Option<(T, usize)>, ProtocolError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let body_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if body_len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body_len));
    }
    if buf.len() < 4 + body_len {
        return Ok(None);
    }
    let message = serde_json::from_slice(&buf[4..4 + body_len])?;
    Ok(Some((message, 4 + body_len)))
}
