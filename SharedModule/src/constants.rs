//! # Shared Constants
//!
//! Constants used by both the peer runtime and the server transport.

/// Network liveness and id constants
pub mod network {
    /// Peers silent for longer than this are evicted (in milliseconds)
    pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 30_000;

    /// First network id handed out by a network
    pub const FIRST_NETWORK_ID: u32 = 1;

    /// Network ids carry the allocating peer's slot above this bit
    pub const NETWORK_ID_PEER_SHIFT: u32 = 20;

    /// Bits of a network id left for the per-peer counter
    pub const NETWORK_ID_COUNTER_MASK: u32 = (1 << NETWORK_ID_PEER_SHIFT) - 1;
}

/// Well-known data channel names
pub mod channels {
    /// Unreliable stream of entity transforms
    pub const TRANSFORM: &str = "entity.transform";
}
