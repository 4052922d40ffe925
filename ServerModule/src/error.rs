//! Error types for the server transport

use netsync_shared::{CodecError, PeerId};
use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in the server transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{operation} is not supported for the {role} role")]
    Unsupported {
        operation: &'static str,
        role: &'static str,
    },

    #[error("Peer not found: {0}")]
    UnknownPeer(PeerId),

    #[error("Producer error: {0}")]
    Producer(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
