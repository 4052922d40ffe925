//! # SharedModule
//!
//! Shared types used by both the peer runtime and the server transport of the
//! entity authority protocol. This module contains the identifier types, the
//! wire actions with their provenance envelope, and the codec, so every peer
//! agrees on what goes over the wire.

// Export module structure
pub mod types;
pub mod action;
pub mod codec;
pub mod constants;
pub mod connection;
pub mod lifecycle;

// Re-export commonly used items for convenience
pub use types::*;
pub use action::{
    ActionEnvelope, DestroyEntity, NetworkAction, RequestAuthorityOverObject, SpawnEntity,
    TransferAuthorityOfObject, UpdatePeers,
};
pub use codec::{CodecError, CodecResult, DecodedBatch};
pub use connection::{DataChannelType, DisconnectReason, NetworkTopic, PeerSummary};
pub use lifecycle::{AuthorityRole, MaterializationState};
