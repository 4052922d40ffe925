#![allow(dead_code)]

use netsync_peer::{Network, PeerRuntime, ReconcileEvent, TickReport};
use netsync_shared::{ActionEnvelope, NetworkTopic, PeerId, UserId};

/// Fully connected in-memory mesh of peer runtimes
///
/// Every runtime sees the same world peer list; `relay` plays the hub: it
/// hands each outgoing batch to every runtime, its originator included, so
/// all replicas apply the same sequence.
pub struct Mesh {
    pub runtimes: Vec<PeerRuntime>,
}

impl Mesh {
    /// `peers` are `(peer id, user id)` pairs, registered in the given order
    pub fn new(peers: &[(&str, &str)]) -> Self {
        Self::with_host(peers, None)
    }

    pub fn with_host(peers: &[(&str, &str)], host: Option<&str>) -> Self {
        let mut network = Network::new("world", NetworkTopic::World, host.map(PeerId::from));
        for (peer, user) in peers {
            network.add_peer(PeerId::from(*peer), UserId::from(*user), 0);
        }

        let runtimes = peers
            .iter()
            .map(|(peer, user)| {
                let mut runtime = PeerRuntime::new(UserId::from(*user), PeerId::from(*peer));
                runtime.join_network(network.clone());
                runtime
            })
            .collect();
        Self { runtimes }
    }

    pub fn runtime(&self, peer: &str) -> &PeerRuntime {
        self.runtimes
            .iter()
            .find(|runtime| runtime.local_peer().as_str() == peer)
            .expect("peer is part of the mesh")
    }

    pub fn runtime_mut(&mut self, peer: &str) -> &mut PeerRuntime {
        self.runtimes
            .iter_mut()
            .find(|runtime| runtime.local_peer().as_str() == peer)
            .expect("peer is part of the mesh")
    }

    pub fn tick_all(&mut self) -> Vec<(PeerId, TickReport)> {
        self.runtimes
            .iter_mut()
            .map(|runtime| (runtime.local_peer().clone(), runtime.tick()))
            .collect()
    }

    /// Deliver every outgoing batch to every runtime in one global order;
    /// returns the number of actions moved
    pub fn relay(&mut self) -> usize {
        let batches: Vec<Vec<ActionEnvelope>> = self
            .runtimes
            .iter_mut()
            .map(|runtime| runtime.take_outgoing())
            .collect();

        let mut moved = 0;
        for batch in batches {
            moved += batch.len();
            for runtime in &self.runtimes {
                for envelope in &batch {
                    runtime.receive(envelope.clone());
                }
            }
        }
        moved
    }

    /// Tick and relay until nothing moves; returns every event produced,
    /// tagged with the peer that produced it
    pub fn settle(&mut self) -> Vec<(PeerId, ReconcileEvent)> {
        let mut events = Vec::new();
        for _ in 0..32 {
            let reports = self.tick_all();
            let busy = reports
                .iter()
                .any(|(_, report)| report.applied + report.ignored > 0 || !report.events.is_empty());
            for (peer, report) in reports {
                events.extend(report.events.into_iter().map(|event| (peer.clone(), event)));
            }

            if self.relay() == 0 && !busy {
                return events;
            }
        }
        panic!("mesh did not settle");
    }

    /// Drop a peer from the mesh and from every remaining peer list
    pub fn disconnect(&mut self, peer: &str) -> PeerRuntime {
        let position = self
            .runtimes
            .iter()
            .position(|runtime| runtime.local_peer().as_str() == peer)
            .expect("peer is part of the mesh");
        let departed = self.runtimes.remove(position);

        for runtime in &mut self.runtimes {
            if let Some(network) = runtime.context_mut().networks.get_mut(NetworkTopic::World) {
                network.remove_peer(departed.local_peer());
            }
        }
        departed
    }
}

pub fn events_of<'a>(
    events: &'a [(PeerId, ReconcileEvent)],
    peer: &str,
) -> impl Iterator<Item = &'a ReconcileEvent> + 'a {
    let peer = PeerId::from(peer);
    events
        .iter()
        .filter(move |(origin, _)| *origin == peer)
        .map(|(_, event)| event)
}
