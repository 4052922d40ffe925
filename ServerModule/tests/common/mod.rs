#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use netsync_peer::{Network, PeerRuntime, ReconcileEvent};
use netsync_server::{ActionSink, DataProducer, ServerTransport, TransportConfig, TransportError, TransportResult};
use netsync_shared::codec::{decode_actions, encode_actions};
use netsync_shared::{ActionEnvelope, DisconnectReason, NetworkTopic, PeerId, UserId};
use parking_lot::Mutex;

pub const INSTANCE: &str = "lobby";
pub const HOST: &str = "host";

/// Records every payload instead of putting it on a wire
#[derive(Default)]
pub struct Recorder {
    sent: Mutex<Vec<(PeerId, Vec<u8>)>>,
    dead: Mutex<HashSet<PeerId>>,
}

impl Recorder {
    /// Make every send to `peer` fail from now on
    pub fn fail_for(&self, peer: &str) {
        self.dead.lock().insert(PeerId::from(peer));
    }

    pub fn drain(&self) -> Vec<(PeerId, Vec<u8>)> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn payloads_for(&self, peer: &str) -> Vec<Vec<u8>> {
        let peer = PeerId::from(peer);
        self.sent
            .lock()
            .iter()
            .filter(|(target, _)| *target == peer)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    fn record(&self, peer: &PeerId, payload: &[u8]) -> TransportResult<()> {
        if self.dead.lock().contains(peer) {
            return Err(TransportError::Producer(format!("{} is gone", peer)));
        }
        self.sent.lock().push((peer.clone(), payload.to_vec()));
        Ok(())
    }
}

/// Fake of the directly-wired action transport
#[derive(Default)]
pub struct RecordingSink(pub Recorder);

impl RecordingSink {
    /// Decoded action batches sent to `peer`, in send order
    pub fn batches_for(&self, peer: &str) -> Vec<Vec<ActionEnvelope>> {
        self.0
            .payloads_for(peer)
            .iter()
            .map(|payload| decode_actions(payload).expect("sink payloads decode").actions)
            .collect()
    }
}

impl ActionSink for RecordingSink {
    fn send(&self, peer: &PeerId, payload: &[u8]) -> TransportResult<()> {
        self.0.record(peer, payload)
    }
}

/// Fake data channel producer
#[derive(Default)]
pub struct RecordingProducer(pub Recorder);

impl DataProducer for RecordingProducer {
    fn send(&self, peer: &PeerId, payload: &[u8]) -> TransportResult<()> {
        self.0.record(peer, payload)
    }
}

pub fn config() -> TransportConfig {
    TransportConfig::new(INSTANCE, PeerId::from(HOST), NetworkTopic::World)
}

pub fn server() -> (ServerTransport, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let server = ServerTransport::bootstrap(config(), sink.clone()).expect("valid config");
    (server, sink)
}

/// A server plus client runtimes, connected through the recording sink
pub struct Harness {
    pub server: ServerTransport,
    pub sink: Arc<RecordingSink>,
    pub clients: Vec<PeerRuntime>,
    pub now_ms: u64,
}

impl Harness {
    pub fn new() -> Self {
        let (server, sink) = server();
        Self {
            server,
            sink,
            clients: Vec::new(),
            now_ms: 0,
        }
    }

    pub fn connect(&mut self, peer: &str, user: &str) {
        let mut client = PeerRuntime::new(UserId::from(user), PeerId::from(peer));
        client.join_network(Network::new(INSTANCE, NetworkTopic::World, Some(PeerId::from(HOST))));
        self.clients.push(client);
        self.server
            .on_peer_connected(PeerId::from(peer), UserId::from(user), self.now_ms)
            .expect("peer registers");
    }

    /// Drop a client runtime without telling the server
    pub fn drop_client(&mut self, peer: &str) -> PeerRuntime {
        let position = self
            .clients
            .iter()
            .position(|client| client.local_peer().as_str() == peer)
            .expect("client is connected");
        self.clients.remove(position)
    }

    pub fn disconnect(&mut self, peer: &str) {
        self.drop_client(peer);
        self.server
            .on_peer_disconnected(&PeerId::from(peer), DisconnectReason::ClientRequest)
            .expect("peer was registered");
    }

    pub fn client(&self, peer: &str) -> &PeerRuntime {
        self.clients
            .iter()
            .find(|client| client.local_peer().as_str() == peer)
            .expect("client is connected")
    }

    pub fn client_mut(&mut self, peer: &str) -> &mut PeerRuntime {
        self.clients
            .iter_mut()
            .find(|client| client.local_peer().as_str() == peer)
            .expect("client is connected")
    }

    /// Tick everyone and move messages until the system is quiet; returns
    /// the client events produced, tagged with their peer
    pub fn pump(&mut self) -> Vec<(PeerId, ReconcileEvent)> {
        let mut events = Vec::new();
        for _ in 0..32 {
            let mut busy = false;

            for client in &mut self.clients {
                let report = client.tick();
                busy |= report.applied + report.ignored > 0 || !report.events.is_empty();
                let peer = client.local_peer().clone();
                events.extend(report.events.into_iter().map(|event| (peer.clone(), event)));

                let outgoing = client.take_outgoing();
                if !outgoing.is_empty() {
                    busy = true;
                    let payload = encode_actions(&outgoing).expect("actions encode");
                    self.server.on_message(&peer, &payload, self.now_ms);
                }
            }

            let report = self.server.tick().expect("server tick");
            busy |= report.applied + report.ignored > 0 || !report.events.is_empty();

            for (peer, payload) in self.sink.0.drain() {
                busy = true;
                let batch = decode_actions(&payload).expect("sink payloads decode");
                if let Some(client) = self.clients.iter().find(|client| *client.local_peer() == peer) {
                    for envelope in batch.actions {
                        client.receive(envelope);
                    }
                }
            }

            if !busy {
                return events;
            }
        }
        panic!("harness did not settle");
    }
}
