//! # Server Transport
//!
//! Server side of the authority protocol. A [`ServerTransport`] owns the host
//! peer's [`PeerRuntime`] for one network instance and wires it to the
//! outside world:
//!
//! - inbound action batches are decoded, stamped with the sender's
//!   provenance and parked for the host's next tick
//! - accepted client actions and the host's own dispatches are relayed to
//!   every client through the directly-wired [`ActionSink`], originators
//!   included, so every replica applies them in the host's order
//! - buffered data channel messages fan out through per-channel
//!   [`DataProducer`]s
//!
//! All entry points take `&self`; transport callbacks may arrive on any
//! thread while the scheduler ticks.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use netsync_peer::{Network, PeerRuntime, TickReport};
use netsync_shared::codec::encode_actions;
use netsync_shared::{ActionEnvelope, DataChannelType, NetworkTopic, PeerId, UserId};
use parking_lot::{Mutex, RwLock};

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};

pub mod fanout;
pub mod inbound;

/// Directly-wired outgoing transport carrying reliable action batches
pub trait ActionSink: Send + Sync {
    fn send(&self, peer: &PeerId, payload: &[u8]) -> TransportResult<()>;
}

/// Per-channel producer for buffered data channel messages
pub trait DataProducer: Send + Sync {
    fn send(&self, peer: &PeerId, payload: &[u8]) -> TransportResult<()>;
}

/// The server's transport for one network instance
pub struct ServerTransport {
    pub(crate) config: TransportConfig,
    pub(crate) runtime: Arc<Mutex<PeerRuntime>>,
    sink: Arc<dyn ActionSink>,
    producers: RwLock<HashMap<DataChannelType, Arc<dyn DataProducer>>>,

    /// Client actions accepted since the last tick, in arrival order
    forward: Mutex<Vec<ActionEnvelope>>,
}

impl ServerTransport {
    /// Create the host runtime and its network, and wire the sink
    pub fn bootstrap(config: TransportConfig, sink: Arc<dyn ActionSink>) -> TransportResult<Self> {
        config.validate()?;

        let mut runtime = PeerRuntime::new(config.host_user_id.clone(), config.host_peer_id.clone());
        let mut network = Network::new(
            config.instance_id.clone(),
            config.topic,
            Some(config.host_peer_id.clone()),
        );
        network.add_peer(config.host_peer_id.clone(), config.host_user_id.clone(), 0);
        runtime.join_network(network);

        info!(
            "Server transport for {:?} network {} bootstrapped as host {}",
            config.topic, config.instance_id, config.host_peer_id
        );

        Ok(Self {
            config,
            runtime: Arc::new(Mutex::new(runtime)),
            sink,
            producers: RwLock::new(HashMap::new()),
            forward: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn topic(&self) -> NetworkTopic {
        self.config.topic
    }

    pub fn host_peer_id(&self) -> &PeerId {
        &self.config.host_peer_id
    }

    /// Shared handle to the host runtime, e.g. for dispatching host actions
    pub fn runtime(&self) -> Arc<Mutex<PeerRuntime>> {
        Arc::clone(&self.runtime)
    }

    /// Run `f` against the served network, if the host has it
    pub fn with_network<R>(&self, f: impl FnOnce(&Network) -> R) -> Option<R> {
        let runtime = self.runtime.lock();
        runtime.context().networks.get(self.config.topic).map(f)
    }

    pub fn peer_count(&self) -> usize {
        self.with_network(Network::peer_count).unwrap_or(0)
    }

    pub fn user_of(&self, peer: &PeerId) -> Option<UserId> {
        self.with_network(|network| network.peer(peer).map(|p| p.user_id.clone()))
            .flatten()
    }

    /// Tick the host runtime, then relay what it applied
    ///
    /// The host's pending dispatches and the client actions accepted since
    /// the last tick are applied in that order, and every client gets that
    /// same sequence as one batch. Originators get their own actions back
    /// and re-apply them, which settles any optimistic local application
    /// into the host's order.
    pub fn tick(&self) -> TransportResult<TickReport> {
        let (report, batch, targets) = {
            let mut runtime = self.runtime.lock();
            let mut batch = runtime.take_outgoing();
            let pending = batch.len();

            let inbound = std::mem::take(&mut *self.forward.lock());
            for envelope in &inbound {
                runtime.receive(envelope.clone());
            }
            batch.extend(inbound);

            let report = runtime.tick();
            debug!(
                "Host applied {} own and {} client actions",
                pending,
                batch.len() - pending
            );
            (report, batch, self.client_peers(&runtime))
        };

        self.relay(&batch, &targets)?;
        Ok(report)
    }

    /// Send one batch to every target; returns the number of batches the
    /// sink accepted
    fn relay(&self, batch: &[ActionEnvelope], targets: &[PeerId]) -> TransportResult<usize> {
        let mut sent = 0;
        for target in targets {
            if self.send_batch(target, batch)? {
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Every registered peer except the host
    pub(crate) fn client_peers(&self, runtime: &PeerRuntime) -> Vec<PeerId> {
        let mut peers: Vec<PeerId> = runtime
            .context()
            .networks
            .get(self.config.topic)
            .map(|network| {
                network
                    .peers()
                    .filter(|peer| peer.peer_id != self.config.host_peer_id)
                    .map(|peer| peer.peer_id.clone())
                    .collect()
            })
            .unwrap_or_default();
        peers.sort();
        peers
    }

    /// Encode and send one batch; false when there was nothing to send or
    /// the sink dropped it
    pub(crate) fn send_batch(&self, peer: &PeerId, batch: &[ActionEnvelope]) -> TransportResult<bool> {
        if batch.is_empty() {
            return Ok(false);
        }
        let payload = encode_actions(batch)?;
        match self.sink.send(peer, &payload) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("Dropped batch of {} actions for peer {}: {}", batch.len(), peer, err);
                Ok(false)
            }
        }
    }

    /// Park accepted client actions for the next tick
    pub(crate) fn queue_forward(&self, envelopes: Vec<ActionEnvelope>) {
        self.forward.lock().extend(envelopes);
    }

    pub(crate) fn unsupported(operation: &'static str) -> TransportError {
        TransportError::Unsupported {
            operation,
            role: "server",
        }
    }
}
