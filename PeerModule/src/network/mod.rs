//! # Network State
//!
//! Per-network peer bookkeeping: which peers are connected, which user each
//! peer belongs to, the compact indices used on the wire, the host peer and
//! the last time each peer was heard from.
//!
//! Mutation lives in [`peers`]; lookup of the world/media network by role
//! lives in [`registry`].

use std::collections::HashMap;

use netsync_shared::constants::network::{
    FIRST_NETWORK_ID, NETWORK_ID_COUNTER_MASK, NETWORK_ID_PEER_SHIFT,
};
use netsync_shared::{NetworkId, NetworkTopic, PeerId, PeerIndex, PeerSummary, TimestampMs, UserId, UserIndex};

pub mod peers;
pub mod registry;

pub use registry::{ActiveNetwork, NetworkRegistry};

/// One peer connected to a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPeer {
    pub peer_id: PeerId,
    pub peer_index: PeerIndex,
    pub user_id: UserId,
    pub user_index: UserIndex,

    /// Last time any message (including an empty heartbeat) arrived
    pub last_seen_ms: TimestampMs,
}

impl NetworkPeer {
    pub fn summary(&self) -> PeerSummary {
        PeerSummary {
            peer_id: self.peer_id.clone(),
            peer_index: self.peer_index,
            user_id: self.user_id.clone(),
            user_index: self.user_index,
        }
    }
}

/// Peer registry of one logical network
#[derive(Debug, Clone)]
pub struct Network {
    /// Instance identifier of the network
    id: String,
    topic: NetworkTopic,
    host_id: Option<PeerId>,

    peers: HashMap<PeerId, NetworkPeer>,

    /// Peers per user, in join order
    users: HashMap<UserId, Vec<PeerId>>,

    peer_index_to_id: HashMap<PeerIndex, PeerId>,
    user_index_to_id: HashMap<UserIndex, UserId>,

    next_peer_index: PeerIndex,
    next_user_index: UserIndex,
    next_network_id: u32,
}

impl Network {
    pub fn new(id: impl Into<String>, topic: NetworkTopic, host_id: Option<PeerId>) -> Self {
        Self {
            id: id.into(),
            topic,
            host_id,
            peers: HashMap::new(),
            users: HashMap::new(),
            peer_index_to_id: HashMap::new(),
            user_index_to_id: HashMap::new(),
            next_peer_index: 0,
            next_user_index: 0,
            next_network_id: FIRST_NETWORK_ID,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn topic(&self) -> NetworkTopic {
        self.topic
    }

    pub fn host_id(&self) -> Option<&PeerId> {
        self.host_id.as_ref()
    }

    pub fn set_host_id(&mut self, host_id: Option<PeerId>) {
        self.host_id = host_id;
    }

    /// User of the host peer, if the host is currently connected
    pub fn host_user(&self) -> Option<&UserId> {
        self.host_id
            .as_ref()
            .and_then(|host| self.peers.get(host))
            .map(|peer| &peer.user_id)
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<&NetworkPeer> {
        self.peers.get(peer_id)
    }

    pub fn contains_peer(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    pub fn peer_index(&self, peer_id: &PeerId) -> Option<PeerIndex> {
        self.peers.get(peer_id).map(|peer| peer.peer_index)
    }

    pub fn peer_by_index(&self, index: PeerIndex) -> Option<&PeerId> {
        self.peer_index_to_id.get(&index)
    }

    pub fn user_by_index(&self, index: UserIndex) -> Option<&UserId> {
        self.user_index_to_id.get(&index)
    }

    /// Peers of `user_id` in join order; empty when the user is not connected
    pub fn user_peers(&self, user_id: &UserId) -> &[PeerId] {
        self.users.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn user_connected(&self, user_id: &UserId) -> bool {
        !self.user_peers(user_id).is_empty()
    }

    pub fn peers(&self) -> impl Iterator<Item = &NetworkPeer> {
        self.peers.values()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Peer list as broadcast to clients, ordered by peer index
    pub fn summaries(&self) -> Vec<PeerSummary> {
        let mut summaries: Vec<_> = self.peers.values().map(NetworkPeer::summary).collect();
        summaries.sort_by_key(|summary| summary.peer_index);
        summaries
    }

    /// Peers not heard from within `timeout_ms`; the host is never stale
    pub fn stale_peers(&self, now_ms: TimestampMs, timeout_ms: u64) -> Vec<PeerId> {
        let mut stale: Vec<_> = self
            .peers
            .values()
            .filter(|peer| Some(&peer.peer_id) != self.host_id.as_ref())
            .filter(|peer| now_ms.saturating_sub(peer.last_seen_ms) > timeout_ms)
            .map(|peer| peer.peer_id.clone())
            .collect();
        stale.sort();
        stale
    }

    /// Hand out the next compact entity id for spawns by `local_peer`
    ///
    /// The high bits hold the peer's index plus one, so peers sharing a user
    /// never hand out the same id. A peer not yet in the list draws from
    /// slot zero.
    pub fn allocate_network_id(&mut self, local_peer: &PeerId) -> NetworkId {
        let slot = self.peer_index(local_peer).map_or(0, |index| index.wrapping_add(1));
        let counter = self.next_network_id & NETWORK_ID_COUNTER_MASK;
        self.next_network_id = self.next_network_id.wrapping_add(1);
        NetworkId(slot.wrapping_shl(NETWORK_ID_PEER_SHIFT) | counter)
    }
}
