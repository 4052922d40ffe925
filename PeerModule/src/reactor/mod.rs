//! # Reconciliation Reactor
//!
//! Bridges the abstract ledger and the peer registry to concrete local
//! entities. Once per tick [`Reconciler::reconcile`] diffs the ledger's key
//! set against the per-entity state machines it holds, mounts and unmounts
//! them, and re-evaluates every mounted entity:
//!
//! 1. materialization gate (owner connected?)
//! 2. network object descriptor (re)application
//! 3. authority-request arbitration, owner only
//! 4. owner-peer failover, elected leader only
//!
//! Actions produced by a pass are dispatched after the pass and take effect
//! on the next tick.

use std::collections::BTreeMap;

use log::{debug, info};
use netsync_shared::{EntityUuid, MaterializationState, NetworkAction, PeerId, UserId};

use crate::context::PeerContext;
use crate::ledger::{EntityLedger, OwnershipRecord};
use crate::network::ActiveNetwork;

pub mod entities;
pub mod failover;

pub use entities::{Entity, LocalEntities, LocalEntity, NetworkObject};

/// Local effect produced by a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// A local entity was created for a ledger record
    Materialized { entity_uuid: EntityUuid, entity: Entity },

    /// The owner disconnected and the local entity was destroyed
    Dematerialized { entity_uuid: EntityUuid, entity: Entity },

    /// The descriptor of a materialized entity changed
    NetworkObjectApplied {
        entity_uuid: EntityUuid,
        network_object: NetworkObject,
    },

    /// The local owner granted a pending authority request
    AuthorityGranted { entity_uuid: EntityUuid, to: PeerId },

    /// The local peer won the failover election and re-spawned the entity
    FailoverRespawn {
        entity_uuid: EntityUuid,
        departed_peer: PeerId,
        authority_reassigned: bool,
    },

    /// The ledger record is gone; the entity stays absent until a new spawn
    Removed { entity_uuid: EntityUuid },
}

/// State machine of one ledger entity on this peer
#[derive(Debug, Clone, Default)]
struct EntityReactor {
    state: MaterializationState,

    /// Descriptor last applied to the local entity
    applied: Option<NetworkObject>,

    /// Request most recently granted, so a pending request is granted once
    granted_request: Option<PeerId>,

    /// Owner peer last observed as registered
    owner_peer_seen: Option<PeerId>,

    /// Owner peer this peer already re-spawned the entity for
    respawned_for: Option<PeerId>,
}

/// Keyed collection of per-entity reactors plus the local entity arena
#[derive(Debug, Default)]
pub struct Reconciler {
    reactors: BTreeMap<EntityUuid, EntityReactor>,
    entities: LocalEntities,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> &LocalEntities {
        &self.entities
    }

    pub fn materialization(&self, entity_uuid: &EntityUuid) -> MaterializationState {
        self.reactors
            .get(entity_uuid)
            .map(|reactor| reactor.state)
            .unwrap_or_default()
    }

    /// Run one reconciliation pass
    pub fn reconcile(&mut self, context: &mut PeerContext, ledger: &EntityLedger) -> Vec<ReconcileEvent> {
        let mut events = Vec::new();
        self.unmount_removed(ledger, &mut events);

        let mut dispatches = Vec::new();
        {
            let world = context.world();
            for (uuid, record) in ledger.iter() {
                let reactor = self.reactors.entry(uuid.clone()).or_default();
                let owner = context.resolve_owner(&record.owner_id);
                let connected = owner_connected(context, world, &record.owner_id);

                gate(&mut self.entities, reactor, uuid, connected, &mut events);
                apply_descriptor(&mut self.entities, reactor, uuid, record, &owner, &mut events);

                if let Some(action) = arbitrate(reactor, uuid, record, &owner, &context.local_user) {
                    events.push(ReconcileEvent::AuthorityGranted {
                        entity_uuid: uuid.clone(),
                        to: record.requesting_peer_id.clone().unwrap_or_else(|| record.owner_peer.clone()),
                    });
                    dispatches.push(action);
                }

                if let Some((action, event)) = failover(reactor, uuid, record, &owner, context, world) {
                    events.push(event);
                    dispatches.push(action);
                }
            }
        }

        for action in dispatches {
            context.dispatch(action);
        }
        events
    }

    /// Unmount reactors whose record left the ledger, destroying their local
    /// entity in the same pass
    fn unmount_removed(&mut self, ledger: &EntityLedger, events: &mut Vec<ReconcileEvent>) {
        let removed: Vec<EntityUuid> = self
            .reactors
            .keys()
            .filter(|uuid| !ledger.contains(uuid))
            .cloned()
            .collect();

        for uuid in removed {
            self.reactors.remove(&uuid);
            if let Some(entity) = self.entities.destroy(&uuid) {
                events.push(ReconcileEvent::Dematerialized {
                    entity_uuid: uuid.clone(),
                    entity,
                });
            }
            info!("Entity {} removed from ledger", uuid);
            events.push(ReconcileEvent::Removed { entity_uuid: uuid });
        }
    }
}

/// Whether the owning user counts as connected for materialization
fn owner_connected(context: &PeerContext, world: ActiveNetwork<'_>, owner_id: &UserId) -> bool {
    if owner_id.is_scene() || *owner_id == context.local_user {
        return true;
    }
    world
        .network()
        .map(|network| network.user_connected(owner_id))
        .unwrap_or(false)
}

fn gate(
    entities: &mut LocalEntities,
    reactor: &mut EntityReactor,
    uuid: &EntityUuid,
    connected: bool,
    events: &mut Vec<ReconcileEvent>,
) {
    match (reactor.state, connected) {
        (MaterializationState::Absent, true) => {
            let entity = entities.create(uuid);
            reactor.state = MaterializationState::Materialized;
            debug!("Materialized entity {}", uuid);
            events.push(ReconcileEvent::Materialized {
                entity_uuid: uuid.clone(),
                entity,
            });
        }
        (MaterializationState::Materialized, false) => {
            reactor.state = MaterializationState::Absent;
            reactor.applied = None;
            if let Some(entity) = entities.destroy(uuid) {
                debug!("Dematerialized entity {}, owner disconnected", uuid);
                events.push(ReconcileEvent::Dematerialized {
                    entity_uuid: uuid.clone(),
                    entity,
                });
            }
        }
        _ => {}
    }
}

fn apply_descriptor(
    entities: &mut LocalEntities,
    reactor: &mut EntityReactor,
    uuid: &EntityUuid,
    record: &OwnershipRecord,
    owner: &UserId,
    events: &mut Vec<ReconcileEvent>,
) {
    if reactor.state != MaterializationState::Materialized {
        return;
    }

    let descriptor = NetworkObject {
        owner_id: owner.clone(),
        owner_peer: record.owner_peer.clone(),
        authority_peer_id: record.authority_peer_id.clone(),
        network_id: record.network_id,
    };
    if reactor.applied.as_ref() == Some(&descriptor) {
        return;
    }

    entities.set_network_object(uuid, descriptor.clone());
    reactor.applied = Some(descriptor.clone());
    events.push(ReconcileEvent::NetworkObjectApplied {
        entity_uuid: uuid.clone(),
        network_object: descriptor,
    });
}

/// Grant a pending request when the local user owns the entity
fn arbitrate(
    reactor: &mut EntityReactor,
    uuid: &EntityUuid,
    record: &OwnershipRecord,
    owner: &UserId,
    local_user: &UserId,
) -> Option<NetworkAction> {
    let requesting = match &record.requesting_peer_id {
        Some(requesting) => requesting,
        None => {
            reactor.granted_request = None;
            return None;
        }
    };
    if owner != local_user || reactor.granted_request.as_ref() == Some(requesting) {
        return None;
    }

    info!("Granting authority over {} to peer {}", uuid, requesting);
    reactor.granted_request = Some(requesting.clone());
    Some(NetworkAction::transfer_authority(
        record.owner_id.clone(),
        uuid.clone(),
        requesting.clone(),
    ))
}

/// Re-spawn the entity when its owner peer left and this peer is the leader
fn failover(
    reactor: &mut EntityReactor,
    uuid: &EntityUuid,
    record: &OwnershipRecord,
    owner: &UserId,
    context: &PeerContext,
    world: ActiveNetwork<'_>,
) -> Option<(NetworkAction, ReconcileEvent)> {
    let network = world.network()?;

    if network.contains_peer(&record.owner_peer) {
        reactor.owner_peer_seen = Some(record.owner_peer.clone());
        return None;
    }
    if reactor.owner_peer_seen.as_ref() != Some(&record.owner_peer)
        || reactor.respawned_for.as_ref() == Some(&record.owner_peer)
        || *owner != context.local_user
    {
        return None;
    }

    let action = failover::plan_respawn(network, uuid, record, owner, &context.local_peer)?;
    let authority_reassigned = matches!(
        &action,
        NetworkAction::SpawnEntity(spawn) if spawn.authority_peer_id.is_some()
    );

    info!(
        "Peer {} elected to re-spawn {} after owner peer {} left",
        context.local_peer, uuid, record.owner_peer
    );
    reactor.respawned_for = Some(record.owner_peer.clone());
    Some((
        action,
        ReconcileEvent::FailoverRespawn {
            entity_uuid: uuid.clone(),
            departed_peer: record.owner_peer.clone(),
            authority_reassigned,
        },
    ))
}
