//! # Connection Management
//!
//! Peer join and leave handling for the server transport, plus the liveness
//! sweep evicting peers that stopped sending heartbeats.

// Module declarations
pub mod handlers;  // Join/leave event handlers
pub mod liveness;  // Heartbeat timeout eviction
