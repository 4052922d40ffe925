//! # Inbound Messages
//!
//! The `onMessage` callback: liveness bookkeeping plus decoding of action
//! batches for the host's next tick.

use log::{debug, warn};
use netsync_shared::codec::decode_actions;
use netsync_shared::{NetworkAction, PeerId, TimestampMs};

use super::ServerTransport;

impl ServerTransport {
    /// Handle one message from `from`
    ///
    /// Any message refreshes the sender's last-seen time; an empty one is a
    /// pure heartbeat. Decoded actions are stamped with the registry's view
    /// of the sender, whatever provenance they claim, then parked for the
    /// next tick, which applies and relays them. Returns the number of
    /// actions accepted.
    pub fn on_message(&self, from: &PeerId, message: &[u8], now_ms: TimestampMs) -> usize {
        let user = {
            let mut runtime = self.runtime.lock();
            let network = match runtime.context_mut().networks.get_mut(self.config.topic) {
                Some(network) => network,
                None => return 0,
            };
            if !network.touch(from, now_ms) {
                debug!("Dropped message from unregistered peer {}", from);
                return 0;
            }
            match network.peer(from) {
                Some(peer) => peer.user_id.clone(),
                None => return 0,
            }
        };

        if message.is_empty() {
            return 0;
        }

        let batch = match decode_actions(message) {
            Ok(batch) => batch,
            Err(err) => {
                warn!("Dropped undecodable message from peer {}: {}", from, err);
                return 0;
            }
        };
        if batch.rejected > 0 {
            warn!(
                "Dropped {} malformed actions from peer {}",
                batch.rejected, from
            );
        }

        let mut accepted = Vec::with_capacity(batch.actions.len());
        for mut envelope in batch.actions {
            if let NetworkAction::UpdatePeers(_) = envelope.action {
                warn!("Dropped peer list sent by client peer {}", from);
                continue;
            }
            envelope.peer = from.clone();
            envelope.from = Some(user.clone());
            envelope.topic = self.config.topic;
            accepted.push(envelope);
        }

        let count = accepted.len();
        self.queue_forward(accepted);
        count
    }

    /// Refresh a peer's last-seen time; false if the peer is unknown
    pub fn touch(&self, peer: &PeerId, now_ms: TimestampMs) -> bool {
        let mut runtime = self.runtime.lock();
        runtime
            .context_mut()
            .networks
            .get_mut(self.config.topic)
            .map(|network| network.touch(peer, now_ms))
            .unwrap_or(false)
    }
}
