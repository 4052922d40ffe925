//! # Peer Context
//!
//! Explicit session object threaded through receptors and reactors: who the
//! local peer is, which networks it belongs to, and where dispatched actions
//! go.

use log::debug;
use netsync_shared::{ActionEnvelope, NetworkAction, NetworkTopic, PeerId, UserId};

use crate::network::{ActiveNetwork, NetworkRegistry};
use crate::queue::ActionQueue;

/// Session state of the local peer
#[derive(Debug)]
pub struct PeerContext {
    pub local_user: UserId,
    pub local_peer: PeerId,
    pub networks: NetworkRegistry,
    pub(crate) queue: ActionQueue,
}

impl PeerContext {
    pub fn new(local_user: UserId, local_peer: PeerId) -> Self {
        Self {
            local_user,
            local_peer,
            networks: NetworkRegistry::new(),
            queue: ActionQueue::new(),
        }
    }

    pub fn world(&self) -> ActiveNetwork<'_> {
        self.networks.world()
    }

    /// Dispatch an action on the world network
    pub fn dispatch(&mut self, action: NetworkAction) {
        self.dispatch_to(NetworkTopic::World, action);
    }

    /// Dispatch an action: it is applied locally on the next tick and queued
    /// for the transport to send.
    ///
    /// A spawn without a network id gets one from the addressed network,
    /// drawn from the local peer's share of the id space.
    pub fn dispatch_to(&mut self, topic: NetworkTopic, mut action: NetworkAction) {
        if let NetworkAction::SpawnEntity(spawn) = &mut action {
            if spawn.network_id.is_none() {
                if let Some(network) = self.networks.get_mut(topic) {
                    spawn.network_id = Some(network.allocate_network_id(&self.local_peer));
                }
            }
        }

        debug!("Peer {} dispatching {}", self.local_peer, action.kind());
        let envelope = ActionEnvelope::new(
            self.local_peer.clone(),
            Some(self.local_user.clone()),
            topic,
            action,
        );
        self.queue.enqueue_incoming(envelope.clone());
        self.queue.push_outgoing(envelope);
    }

    /// User allowed to act for scene-owned entities: the world host's
    pub fn scene_arbiter(&self) -> Option<UserId> {
        self.world()
            .network()
            .and_then(|network| network.host_user())
            .cloned()
    }

    /// Resolve the scene pseudo-user to a concrete user
    ///
    /// Scene-owned entities belong to the world host's user, or to the local
    /// user when no host is connected.
    pub fn resolve_owner(&self, owner: &UserId) -> UserId {
        if !owner.is_scene() {
            return owner.clone();
        }
        self.scene_arbiter()
            .unwrap_or_else(|| self.local_user.clone())
    }
}
