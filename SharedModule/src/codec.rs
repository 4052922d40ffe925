//! # Codec
//!
//! Encoding of action batches and data channel envelopes. Batches are JSON
//! arrays of [`ActionEnvelope`]s; a single malformed entry is dropped rather
//! than failing the whole batch. Data channel envelopes are the two element
//! array `[peerIndex, message]`.

use serde_json::Value;
use thiserror::Error;

use crate::action::ActionEnvelope;
use crate::types::PeerIndex;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding wire buffers
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("empty buffer")]
    Empty,

    #[error("action batch is not an array")]
    NotABatch,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of decoding one inbound batch
#[derive(Debug, Default)]
pub struct DecodedBatch {
    /// Entries that decoded into known actions, in wire order
    pub actions: Vec<ActionEnvelope>,

    /// Number of entries that were dropped as malformed
    pub rejected: usize,
}

/// Encode a batch of actions
pub fn encode_actions(actions: &[ActionEnvelope]) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(actions)?)
}

/// Decode a batch of actions, dropping entries that do not parse
pub fn decode_actions(bytes: &[u8]) -> CodecResult<DecodedBatch> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }

    let entries = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(entries) => entries,
        _ => return Err(CodecError::NotABatch),
    };

    let mut batch = DecodedBatch::default();
    for entry in entries {
        match serde_json::from_value::<ActionEnvelope>(entry) {
            Ok(action) => batch.actions.push(action),
            Err(_) => batch.rejected += 1,
        }
    }
    Ok(batch)
}

/// Wrap a data channel message with the sender's compact peer index
pub fn encode_buffer_envelope(peer_index: PeerIndex, message: &[u8]) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(&(peer_index, message))?)
}

/// Split a data channel envelope into sender index and message
pub fn decode_buffer_envelope(bytes: &[u8]) -> CodecResult<(PeerIndex, Vec<u8>)> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(serde_json::from_slice(bytes)?)
}
