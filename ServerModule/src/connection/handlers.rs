//! # Connection Handlers
//!
//! Handles peer connection and disconnection events. The server is the
//! single registration point of its network: every change is broadcast to
//! the clients as an `updatePeers` action so their replicas observe churn.

use log::{info, warn};
use netsync_peer::{NetworkPeer, PeerRuntime};
use netsync_shared::{
    ActionEnvelope, DisconnectReason, NetworkAction, PeerId, TimestampMs, UpdatePeers, UserId,
};

use crate::error::{TransportError, TransportResult};
use crate::transport::ServerTransport;

impl ServerTransport {
    /// Register a newly connected peer
    ///
    /// Every client receives the new peer list; the newcomer additionally
    /// receives a snapshot of the host ledger so it converges with the
    /// peers that were already there.
    pub fn on_peer_connected(&self, peer: PeerId, user: UserId, now_ms: TimestampMs) -> TransportResult<()> {
        let (peer_list, snapshot, targets) = {
            let mut runtime = self.runtime.lock();
            let network = runtime
                .context_mut()
                .networks
                .get_mut(self.config.topic)
                .ok_or_else(|| {
                    TransportError::Config(format!("no {:?} network joined", self.config.topic))
                })?;
            network.add_peer(peer.clone(), user.clone(), now_ms);

            let peer_list = self.peer_list_action(&runtime);
            let snapshot = runtime.ledger().snapshot_actions(self.config.topic);
            (peer_list, snapshot, self.client_peers(&runtime))
        };

        info!("Peer {} (user {}) connected to {}", peer, user, self.config.instance_id);
        for target in &targets {
            self.send_batch(target, std::slice::from_ref(&peer_list))?;
        }
        self.send_batch(&peer, &snapshot)?;
        Ok(())
    }

    /// Unregister a peer and broadcast the remaining peer list
    ///
    /// The host peer itself cannot be disconnected.
    pub fn on_peer_disconnected(&self, peer: &PeerId, reason: DisconnectReason) -> TransportResult<NetworkPeer> {
        if *peer == self.config.host_peer_id {
            warn!("Ignoring disconnect of host peer {} ({})", peer, reason);
            return Err(Self::unsupported("disconnecting the host peer"));
        }

        let (removed, peer_list, targets) = {
            let mut runtime = self.runtime.lock();
            let removed = runtime
                .context_mut()
                .networks
                .get_mut(self.config.topic)
                .and_then(|network| network.remove_peer(peer))
                .ok_or_else(|| TransportError::UnknownPeer(peer.clone()))?;

            let peer_list = self.peer_list_action(&runtime);
            (removed, peer_list, self.client_peers(&runtime))
        };

        info!("Peer {} disconnected from {}: {}", peer, self.config.instance_id, reason);
        for target in &targets {
            self.send_batch(target, std::slice::from_ref(&peer_list))?;
        }
        Ok(removed)
    }

    /// The served network's current peer list, attributed to the host
    fn peer_list_action(&self, runtime: &PeerRuntime) -> ActionEnvelope {
        let peers = runtime
            .context()
            .networks
            .get(self.config.topic)
            .map(|network| network.summaries())
            .unwrap_or_default();

        ActionEnvelope::new(
            self.config.host_peer_id.clone(),
            Some(self.config.host_user_id.clone()),
            self.config.topic,
            NetworkAction::UpdatePeers(UpdatePeers { peers }),
        )
    }
}
