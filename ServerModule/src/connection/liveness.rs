//! # Liveness Sweep
//!
//! Evicts peers that have not been heard from within the configured timeout.
//! Eviction goes through the regular disconnect path, so the new peer list
//! reaches every client and owner-peer failover can run on their next tick.

use log::info;
use netsync_shared::{DisconnectReason, PeerId, TimestampMs};

use crate::error::TransportResult;
use crate::transport::ServerTransport;

impl ServerTransport {
    /// Peers silent for longer than `peer_timeout_ms` at `now_ms`
    pub fn stale_peers(&self, now_ms: TimestampMs) -> Vec<PeerId> {
        self.with_network(|network| network.stale_peers(now_ms, self.config.peer_timeout_ms))
            .unwrap_or_default()
    }

    /// Disconnect every stale peer; returns the evicted peer ids
    pub fn evict_stale_peers(&self, now_ms: TimestampMs) -> TransportResult<Vec<PeerId>> {
        let stale = self.stale_peers(now_ms);
        for peer in &stale {
            info!("Evicting peer {}: no heartbeat for {} ms", peer, self.config.peer_timeout_ms);
            self.on_peer_disconnected(peer, DisconnectReason::Timeout)?;
        }
        Ok(stale)
    }
}
