//! # Data Channel Fan-out
//!
//! Buffered data channel messages (`bufferToAll`, `bufferToPeer`) and the
//! producer table backing them.

use std::sync::Arc;

use log::{debug, warn};
use netsync_shared::codec::encode_buffer_envelope;
use netsync_shared::{DataChannelType, PeerId};

use super::{DataProducer, ServerTransport};
use crate::error::TransportResult;

impl ServerTransport {
    /// Install the producer for a channel type, replacing any previous one
    pub fn register_producer(
        &self,
        channel: DataChannelType,
        producer: Arc<dyn DataProducer>,
    ) -> Option<Arc<dyn DataProducer>> {
        debug!("Registered producer for channel {}", channel);
        self.producers.write().insert(channel, producer)
    }

    pub fn remove_producer(&self, channel: &DataChannelType) -> Option<Arc<dyn DataProducer>> {
        self.producers.write().remove(channel)
    }

    pub fn has_producer(&self, channel: &DataChannelType) -> bool {
        self.producers.read().contains_key(channel)
    }

    /// Send `message` from `from` to every other client on the channel
    ///
    /// The payload is wrapped as `[peerIndex, message]` with the sender's
    /// compact index. Without a producer for the channel this is a no-op;
    /// a peer whose send fails is skipped. Returns the number of peers
    /// reached.
    pub fn buffer_to_all(
        &self,
        channel: &DataChannelType,
        from: &PeerId,
        message: &[u8],
    ) -> TransportResult<usize> {
        let producer = match self.producers.read().get(channel) {
            Some(producer) => Arc::clone(producer),
            None => {
                debug!("No producer for channel {}, dropping message", channel);
                return Ok(0);
            }
        };

        let (peer_index, targets) = {
            let runtime = self.runtime.lock();
            let peer_index = runtime
                .context()
                .networks
                .get(self.config.topic)
                .and_then(|network| network.peer_index(from));
            (peer_index, self.client_peers(&runtime))
        };
        let peer_index = match peer_index {
            Some(index) => index,
            None => {
                debug!("Dropped {} message from unregistered peer {}", channel, from);
                return Ok(0);
            }
        };

        let payload = encode_buffer_envelope(peer_index, message)?;
        let mut reached = 0;
        for target in targets.iter().filter(|target| *target != from) {
            match producer.send(target, &payload) {
                Ok(()) => reached += 1,
                Err(err) => warn!("Producer for {} failed on peer {}: {}", channel, target, err),
            }
        }
        Ok(reached)
    }

    /// Targeted sends are a client-role operation
    pub fn buffer_to_peer(
        &self,
        channel: &DataChannelType,
        to: &PeerId,
        _data: &[u8],
    ) -> TransportResult<()> {
        debug!("Refusing bufferToPeer on channel {} to peer {}", channel, to);
        Err(Self::unsupported("bufferToPeer"))
    }
}
