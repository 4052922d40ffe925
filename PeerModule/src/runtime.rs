//! # Peer Runtime
//!
//! One replica of the protocol: session context, ownership ledger and
//! reconciler, driven by an external scheduler calling [`PeerRuntime::tick`]
//! once per simulation frame.
//!
//! Each tick runs two phases:
//!
//! 1. "apply incoming actions": drain the inbox and feed every action to its
//!    receptor (ledger actions to the ledger, peer lists to the registry)
//! 2. reconcile: diff the ledger against the per-entity reactors
//!
//! Anything a phase dispatches lands in the inbox and the outbox, so it is
//! applied locally on the following tick and sent by the transport whenever
//! it flushes.

use log::{debug, warn};
use netsync_shared::{
    ActionEnvelope, AuthorityRole, EntityUuid, NetworkAction, NetworkTopic, PeerId, UpdatePeers,
    UserId,
};

use crate::context::PeerContext;
use crate::ledger::{EntityLedger, IgnoreReason, ReceptorOutcome};
use crate::network::Network;
use crate::queue::ActionSender;
use crate::reactor::{ReconcileEvent, Reconciler};

/// Counters of one "apply incoming actions" phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub ignored: usize,
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub applied: usize,
    pub ignored: usize,
    pub events: Vec<ReconcileEvent>,
}

/// A full protocol replica for one peer
#[derive(Debug)]
pub struct PeerRuntime {
    context: PeerContext,
    ledger: EntityLedger,
    reconciler: Reconciler,
}

impl PeerRuntime {
    pub fn new(local_user: UserId, local_peer: PeerId) -> Self {
        Self {
            context: PeerContext::new(local_user, local_peer),
            ledger: EntityLedger::new(),
            reconciler: Reconciler::new(),
        }
    }

    pub fn context(&self) -> &PeerContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PeerContext {
        &mut self.context
    }

    pub fn ledger(&self) -> &EntityLedger {
        &self.ledger
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.context.local_peer
    }

    pub fn local_user(&self) -> &UserId {
        &self.context.local_user
    }

    /// How the local peer relates to an entity; `None` without a record
    pub fn authority_role(&self, entity_uuid: &EntityUuid) -> Option<AuthorityRole> {
        let record = self.ledger.get(entity_uuid)?;
        let role = if record.authority_peer_id == self.context.local_peer {
            AuthorityRole::Authority
        } else if self.context.resolve_owner(&record.owner_id) == self.context.local_user {
            AuthorityRole::Owner
        } else {
            AuthorityRole::Observer
        };
        Some(role)
    }

    /// Install a network under its topic
    pub fn join_network(&mut self, network: Network) {
        debug!(
            "Peer {} joined {:?} network {}",
            self.context.local_peer,
            network.topic(),
            network.id()
        );
        self.context.networks.insert(network);
    }

    pub fn leave_network(&mut self, topic: NetworkTopic) -> Option<Network> {
        self.context.networks.remove(topic)
    }

    /// Sender transport callbacks use to park inbound actions
    pub fn sender(&self) -> ActionSender {
        self.context.queue.sender()
    }

    /// Park one inbound action for the next tick
    pub fn receive(&self, envelope: ActionEnvelope) {
        self.context.queue.enqueue_incoming(envelope);
    }

    /// Dispatch a world action from this peer
    pub fn dispatch(&mut self, action: NetworkAction) {
        self.context.dispatch(action);
    }

    pub fn dispatch_to(&mut self, topic: NetworkTopic, action: NetworkAction) {
        self.context.dispatch_to(topic, action);
    }

    /// Actions dispatched since the last call, for the transport to send
    pub fn take_outgoing(&mut self) -> Vec<ActionEnvelope> {
        self.context.queue.take_outgoing()
    }

    pub fn has_outgoing(&self) -> bool {
        self.context.queue.has_outgoing()
    }

    /// Apply every parked action, in arrival order
    pub fn apply_incoming_actions(&mut self) -> ApplyReport {
        let mut report = ApplyReport::default();

        for envelope in self.context.queue.drain_incoming() {
            let outcome = match &envelope.action {
                NetworkAction::UpdatePeers(update) => self.on_update_peers(&envelope, update),
                _ if envelope.topic != NetworkTopic::World => {
                    debug!(
                        "Dropped {} addressed to the {:?} network",
                        envelope.action.kind(),
                        envelope.topic
                    );
                    ReceptorOutcome::Ignored(IgnoreReason::NotALedgerAction)
                }
                _ => {
                    let arbiter = self.context.scene_arbiter();
                    self.ledger.receive(&envelope, arbiter.as_ref())
                }
            };

            match outcome {
                ReceptorOutcome::Applied => report.applied += 1,
                ReceptorOutcome::Ignored(_) => report.ignored += 1,
            }
        }
        report
    }

    /// Run one reconciliation pass against the current ledger
    pub fn reconcile(&mut self) -> Vec<ReconcileEvent> {
        self.reconciler.reconcile(&mut self.context, &self.ledger)
    }

    /// Apply incoming actions, then reconcile
    pub fn tick(&mut self) -> TickReport {
        let applied = self.apply_incoming_actions();
        let events = self.reconcile();
        TickReport {
            applied: applied.applied,
            ignored: applied.ignored,
            events,
        }
    }

    /// Replace the addressed network's peer set
    ///
    /// Only the network host may publish peer lists once a host is known.
    fn on_update_peers(&mut self, envelope: &ActionEnvelope, update: &UpdatePeers) -> ReceptorOutcome {
        let network = match self.context.networks.get_mut(envelope.topic) {
            Some(network) => network,
            None => {
                debug!("Dropped peer list for unjoined {:?} network", envelope.topic);
                return ReceptorOutcome::Ignored(IgnoreReason::UnknownNetwork);
            }
        };

        if let Some(host) = network.host_id() {
            if *host != envelope.peer {
                warn!(
                    "Rejected peer list for network {} from non-host peer {}",
                    network.id(),
                    envelope.peer
                );
                return ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance);
            }
        }

        network.apply_peer_list(&update.peers);
        ReceptorOutcome::Applied
    }
}
