//! # Peer Registration
//!
//! The single registration point for a network's peer set. The server calls
//! [`Network::add_peer`] / [`Network::remove_peer`] as peers join and leave;
//! client replicas mirror the server's list through
//! [`Network::apply_peer_list`].

use log::{debug, info};
use netsync_shared::{PeerId, PeerIndex, PeerSummary, TimestampMs, UserId};

use super::{Network, NetworkPeer};

impl Network {
    /// Register a peer, or refresh its last-seen time if already present
    pub fn add_peer(&mut self, peer_id: PeerId, user_id: UserId, now_ms: TimestampMs) -> PeerIndex {
        if let Some(existing) = self.peers.get_mut(&peer_id) {
            existing.last_seen_ms = now_ms;
            return existing.peer_index;
        }

        let peer_index = self.next_peer_index;
        self.next_peer_index += 1;

        let user_index = match self
            .user_index_to_id
            .iter()
            .find(|(_, user)| **user == user_id)
        {
            Some((index, _)) => *index,
            None => {
                let index = self.next_user_index;
                self.next_user_index += 1;
                self.user_index_to_id.insert(index, user_id.clone());
                index
            }
        };

        info!(
            "Peer {} (user {}) joined network {} with index {}",
            peer_id, user_id, self.id, peer_index
        );

        self.peer_index_to_id.insert(peer_index, peer_id.clone());
        self.users
            .entry(user_id.clone())
            .or_default()
            .push(peer_id.clone());
        self.peers.insert(
            peer_id.clone(),
            NetworkPeer {
                peer_id,
                peer_index,
                user_id,
                user_index,
                last_seen_ms: now_ms,
            },
        );

        peer_index
    }

    /// Remove a peer; the user entry goes away with its last peer
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> Option<NetworkPeer> {
        let peer = self.peers.remove(peer_id)?;
        self.peer_index_to_id.remove(&peer.peer_index);

        let user_gone = match self.users.get_mut(&peer.user_id) {
            Some(user_peers) => {
                user_peers.retain(|id| id != peer_id);
                user_peers.is_empty()
            }
            None => false,
        };
        if user_gone {
            self.users.remove(&peer.user_id);
            self.user_index_to_id.remove(&peer.user_index);
        }

        info!("Peer {} (user {}) left network {}", peer.peer_id, peer.user_id, self.id);
        Some(peer)
    }

    /// Record that a peer was heard from; false if the peer is unknown
    pub fn touch(&mut self, peer_id: &PeerId, now_ms: TimestampMs) -> bool {
        match self.peers.get_mut(peer_id) {
            Some(peer) => {
                peer.last_seen_ms = now_ms.max(peer.last_seen_ms);
                true
            }
            None => false,
        }
    }

    /// Replace the peer set with the server's announced list
    ///
    /// Indices come from the server. Last-seen times of peers that stay are
    /// kept; clients do not track liveness of other peers themselves.
    pub fn apply_peer_list(&mut self, peers: &[PeerSummary]) {
        let previous = std::mem::take(&mut self.peers);
        self.users.clear();
        self.peer_index_to_id.clear();
        self.user_index_to_id.clear();

        for summary in peers {
            let last_seen_ms = previous
                .get(&summary.peer_id)
                .map(|peer| peer.last_seen_ms)
                .unwrap_or_default();

            self.peer_index_to_id
                .insert(summary.peer_index, summary.peer_id.clone());
            self.user_index_to_id
                .insert(summary.user_index, summary.user_id.clone());
            self.users
                .entry(summary.user_id.clone())
                .or_default()
                .push(summary.peer_id.clone());
            self.peers.insert(
                summary.peer_id.clone(),
                NetworkPeer {
                    peer_id: summary.peer_id.clone(),
                    peer_index: summary.peer_index,
                    user_id: summary.user_id.clone(),
                    user_index: summary.user_index,
                    last_seen_ms,
                },
            );
        }

        self.next_peer_index = self
            .next_peer_index
            .max(peers.iter().map(|p| p.peer_index + 1).max().unwrap_or(0));
        self.next_user_index = self
            .next_user_index
            .max(peers.iter().map(|p| p.user_index + 1).max().unwrap_or(0));

        debug!(
            "Network {} peer list replaced: {} -> {} peers",
            self.id,
            previous.len(),
            self.peers.len()
        );
    }
}
