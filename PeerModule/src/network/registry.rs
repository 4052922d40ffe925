//! # Network Registry
//!
//! Holds the world and media networks a peer participates in and resolves
//! the one serving a role into an [`ActiveNetwork`] once per tick.

use netsync_shared::{NetworkTopic, PeerId, TimestampMs};

use super::Network;

/// The network serving a role, resolved for one pass
#[derive(Debug, Clone, Copy)]
pub enum ActiveNetwork<'a> {
    None,
    World(&'a Network),
    Media(&'a Network),
}

impl<'a> ActiveNetwork<'a> {
    pub fn network(&self) -> Option<&'a Network> {
        match *self {
            ActiveNetwork::None => None,
            ActiveNetwork::World(network) | ActiveNetwork::Media(network) => Some(network),
        }
    }

    pub fn host_id(&self) -> Option<&'a PeerId> {
        self.network().and_then(Network::host_id)
    }

    pub fn contains_peer(&self, peer_id: &PeerId) -> bool {
        self.network()
            .map(|network| network.contains_peer(peer_id))
            .unwrap_or(false)
    }
}

/// Networks known to one peer, keyed by role
#[derive(Debug, Clone, Default)]
pub struct NetworkRegistry {
    world: Option<Network>,
    media: Option<Network>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a network under its topic, replacing any previous one
    pub fn insert(&mut self, network: Network) -> Option<Network> {
        match network.topic() {
            NetworkTopic::World => self.world.replace(network),
            NetworkTopic::Media => self.media.replace(network),
        }
    }

    pub fn remove(&mut self, topic: NetworkTopic) -> Option<Network> {
        match topic {
            NetworkTopic::World => self.world.take(),
            NetworkTopic::Media => self.media.take(),
        }
    }

    pub fn get(&self, topic: NetworkTopic) -> Option<&Network> {
        match topic {
            NetworkTopic::World => self.world.as_ref(),
            NetworkTopic::Media => self.media.as_ref(),
        }
    }

    pub fn get_mut(&mut self, topic: NetworkTopic) -> Option<&mut Network> {
        match topic {
            NetworkTopic::World => self.world.as_mut(),
            NetworkTopic::Media => self.media.as_mut(),
        }
    }

    pub fn resolve(&self, topic: NetworkTopic) -> ActiveNetwork<'_> {
        match (topic, self.get(topic)) {
            (_, None) => ActiveNetwork::None,
            (NetworkTopic::World, Some(network)) => ActiveNetwork::World(network),
            (NetworkTopic::Media, Some(network)) => ActiveNetwork::Media(network),
        }
    }

    pub fn world(&self) -> ActiveNetwork<'_> {
        self.resolve(NetworkTopic::World)
    }

    /// Refresh a peer's last-seen time on the given network
    pub fn touch(&mut self, topic: NetworkTopic, peer_id: &PeerId, now_ms: TimestampMs) -> bool {
        self.get_mut(topic)
            .map(|network| network.touch(peer_id, now_ms))
            .unwrap_or(false)
    }
}
