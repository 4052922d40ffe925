//! # Ledger Receptors
//!
//! Reducers that apply one incoming action to the ledger. A receptor never
//! fails: stale, unauthorized or out-of-order actions leave the ledger
//! untouched and report why through [`ReceptorOutcome::Ignored`].

use log::{debug, warn};
use netsync_shared::{
    ActionEnvelope, DestroyEntity, NetworkAction, PeerId, RequestAuthorityOverObject, SpawnEntity,
    TransferAuthorityOfObject, UserId,
};

use super::{EntityLedger, OwnershipRecord};

/// Result of feeding one action to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptorOutcome {
    Applied,
    Ignored(IgnoreReason),
}

/// Why an action left the ledger unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The action references an entity with no record
    UnknownEntity,

    /// `ownerID` does not match the record's owner
    NotOwner,

    /// The stamped sender is not the user the action claims to act for
    ForgedProvenance,

    /// The action is not addressed to the ledger
    NotALedgerAction,

    /// The action targets a network this peer has not joined
    UnknownNetwork,
}

impl EntityLedger {
    /// Apply one action to the ledger
    ///
    /// `scene_arbiter` is the user allowed to act for scene-owned entities,
    /// i.e. the world host's user; `None` when no host is connected.
    pub(crate) fn receive(
        &mut self,
        envelope: &ActionEnvelope,
        scene_arbiter: Option<&UserId>,
    ) -> ReceptorOutcome {
        let outcome = match &envelope.action {
            NetworkAction::SpawnEntity(action) => {
                self.on_spawn_object(&envelope.peer, envelope.from.as_ref(), scene_arbiter, action)
            }
            NetworkAction::RequestAuthorityOverObject(action) => {
                self.on_request_authority_over_object(action)
            }
            NetworkAction::TransferAuthorityOfObject(action) => {
                self.on_transfer_authority_of_object(envelope.from.as_ref(), scene_arbiter, action)
            }
            NetworkAction::DestroyEntity(action) => self.on_destroy_object(action),
            NetworkAction::UpdatePeers(_) => ReceptorOutcome::Ignored(IgnoreReason::NotALedgerAction),
        };

        if let ReceptorOutcome::Ignored(reason) = outcome {
            match reason {
                IgnoreReason::NotOwner | IgnoreReason::ForgedProvenance => warn!(
                    "Rejected {} from peer {}: {:?}",
                    envelope.action.kind(),
                    envelope.peer,
                    reason
                ),
                _ => debug!(
                    "Dropped {} from peer {}: {:?}",
                    envelope.action.kind(),
                    envelope.peer,
                    reason
                ),
            }
        }
        outcome
    }

    /// Insert a record, or update it when the entity is re-spawned
    ///
    /// A new record's authority defaults to the spawning peer. A re-spawn
    /// keeps the current authority unless the action names one.
    pub(crate) fn on_spawn_object(
        &mut self,
        peer: &PeerId,
        from: Option<&UserId>,
        scene_arbiter: Option<&UserId>,
        action: &SpawnEntity,
    ) -> ReceptorOutcome {
        if !acts_for(from, &action.owner_id, scene_arbiter) {
            return ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance);
        }

        match self.records.get_mut(&action.entity_uuid) {
            Some(record) => {
                if record.owner_id != action.owner_id {
                    return ReceptorOutcome::Ignored(IgnoreReason::NotOwner);
                }
                record.owner_peer = peer.clone();
                if let Some(network_id) = action.network_id {
                    record.network_id = network_id;
                }
                if let Some(authority) = &action.authority_peer_id {
                    record.authority_peer_id = authority.clone();
                }
            }
            None => {
                self.records.insert(
                    action.entity_uuid.clone(),
                    OwnershipRecord {
                        owner_id: action.owner_id.clone(),
                        owner_peer: peer.clone(),
                        authority_peer_id: action
                            .authority_peer_id
                            .clone()
                            .unwrap_or_else(|| peer.clone()),
                        network_id: action.network_id.unwrap_or_default(),
                        requesting_peer_id: None,
                    },
                );
            }
        }
        ReceptorOutcome::Applied
    }

    /// Mark a pending authority request
    pub(crate) fn on_request_authority_over_object(
        &mut self,
        action: &RequestAuthorityOverObject,
    ) -> ReceptorOutcome {
        match self.records.get_mut(&action.entity_uuid) {
            Some(record) => {
                record.requesting_peer_id = Some(action.new_authority.clone());
                ReceptorOutcome::Applied
            }
            None => ReceptorOutcome::Ignored(IgnoreReason::UnknownEntity),
        }
    }

    /// Move authority, if and only if the owner granted it
    pub(crate) fn on_transfer_authority_of_object(
        &mut self,
        from: Option<&UserId>,
        scene_arbiter: Option<&UserId>,
        action: &TransferAuthorityOfObject,
    ) -> ReceptorOutcome {
        let record = match self.records.get_mut(&action.entity_uuid) {
            Some(record) => record,
            None => return ReceptorOutcome::Ignored(IgnoreReason::UnknownEntity),
        };

        if action.owner_id != record.owner_id {
            return ReceptorOutcome::Ignored(IgnoreReason::NotOwner);
        }
        if !acts_for(from, &record.owner_id, scene_arbiter) {
            return ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance);
        }

        record.authority_peer_id = action.new_authority.clone();
        record.requesting_peer_id = None;
        ReceptorOutcome::Applied
    }

    /// Remove the record; destroying an unknown entity is a no-op
    pub(crate) fn on_destroy_object(&mut self, action: &DestroyEntity) -> ReceptorOutcome {
        match self.records.remove(&action.entity_uuid) {
            Some(_) => ReceptorOutcome::Applied,
            None => ReceptorOutcome::Ignored(IgnoreReason::UnknownEntity),
        }
    }
}

/// Whether a sender stamped as `from` may act for `owner`
///
/// Unstamped actions pass (the owner check still applies). Scene-owned
/// entities may only be acted for by `scene_arbiter`; a network without a
/// connected host has no arbiter and shares its scene entities.
fn acts_for(from: Option<&UserId>, owner: &UserId, scene_arbiter: Option<&UserId>) -> bool {
    match from {
        None => true,
        Some(user) if owner.is_scene() => scene_arbiter.map_or(true, |arbiter| user == arbiter),
        Some(user) => user == owner,
    }
}

#[cfg(test)]
mod tests {
    use netsync_shared::{EntityUuid, NetworkId, NetworkTopic};

    use super::*;

    fn envelope(peer: &str, from: &str, action: NetworkAction) -> ActionEnvelope {
        ActionEnvelope::new(
            PeerId::from(peer),
            Some(UserId::from(from)),
            NetworkTopic::World,
            action,
        )
    }

    fn spawned(uuid: &str, owner: &str, peer: &str) -> EntityLedger {
        let mut ledger = EntityLedger::new();
        let outcome = ledger.receive(
            &envelope(
                peer,
                owner,
                NetworkAction::spawn(EntityUuid::from(uuid), UserId::from(owner)),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Applied);
        ledger
    }

    #[test]
    fn spawn_defaults_authority_to_spawning_peer() {
        let ledger = spawned("e1", "alice", "p1");
        let record = ledger.get(&EntityUuid::from("e1")).unwrap();
        assert_eq!(record.owner_id, UserId::from("alice"));
        assert_eq!(record.owner_peer, PeerId::from("p1"));
        assert_eq!(record.authority_peer_id, PeerId::from("p1"));
        assert_eq!(record.requesting_peer_id, None);
    }

    #[test]
    fn spawn_honours_explicit_authority() {
        let mut ledger = EntityLedger::new();
        ledger.receive(
            &envelope(
                "p2",
                "alice",
                NetworkAction::SpawnEntity(SpawnEntity {
                    entity_uuid: EntityUuid::from("e1"),
                    owner_id: UserId::from("alice"),
                    network_id: Some(NetworkId(4)),
                    authority_peer_id: Some(PeerId::from("p2")),
                }),
            ),
            None,
        );
        let record = ledger.get(&EntityUuid::from("e1")).unwrap();
        assert_eq!(record.authority_peer_id, PeerId::from("p2"));
        assert_eq!(record.network_id, NetworkId(4));
    }

    #[test]
    fn respawn_moves_owner_peer_but_keeps_authority() {
        let mut ledger = spawned("e1", "alice", "p1");
        ledger.receive(
            &envelope(
                "p1",
                "alice",
                NetworkAction::transfer_authority(UserId::from("alice"), EntityUuid::from("e1"), PeerId::from("bob-1")),
            ),
            None,
        );

        ledger.receive(
            &envelope(
                "p2",
                "alice",
                NetworkAction::spawn(EntityUuid::from("e1"), UserId::from("alice")),
            ),
            None,
        );

        let record = ledger.get(&EntityUuid::from("e1")).unwrap();
        assert_eq!(record.owner_peer, PeerId::from("p2"));
        assert_eq!(record.authority_peer_id, PeerId::from("bob-1"));
    }

    #[test]
    fn respawn_by_another_owner_is_rejected() {
        let mut ledger = spawned("e1", "alice", "p1");
        let outcome = ledger.receive(
            &envelope(
                "p9",
                "mallory",
                NetworkAction::spawn(EntityUuid::from("e1"), UserId::from("mallory")),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::NotOwner));
        assert_eq!(ledger.get(&EntityUuid::from("e1")).unwrap().owner_peer, PeerId::from("p1"));
    }

    #[test]
    fn spawning_on_behalf_of_another_user_is_rejected() {
        let mut ledger = EntityLedger::new();
        let outcome = ledger.receive(
            &envelope(
                "p9",
                "mallory",
                NetworkAction::spawn(EntityUuid::from("e1"), UserId::from("alice")),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance));
        assert!(ledger.is_empty());
    }

    #[test]
    fn request_on_unknown_entity_is_dropped() {
        let mut ledger = EntityLedger::new();
        let outcome = ledger.receive(
            &envelope(
                "p2",
                "bob",
                NetworkAction::request_authority(EntityUuid::from("nope"), PeerId::from("p2")),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::UnknownEntity));
        assert!(ledger.is_empty());
    }

    #[test]
    fn transfer_clears_pending_request() {
        let mut ledger = spawned("e1", "alice", "p1");
        ledger.receive(
            &envelope(
                "p2",
                "bob",
                NetworkAction::request_authority(EntityUuid::from("e1"), PeerId::from("p2")),
            ),
            None,
        );
        assert_eq!(
            ledger.get(&EntityUuid::from("e1")).unwrap().requesting_peer_id,
            Some(PeerId::from("p2"))
        );

        ledger.receive(
            &envelope(
                "p1",
                "alice",
                NetworkAction::transfer_authority(UserId::from("alice"), EntityUuid::from("e1"), PeerId::from("p2")),
            ),
            None,
        );
        let record = ledger.get(&EntityUuid::from("e1")).unwrap();
        assert_eq!(record.authority_peer_id, PeerId::from("p2"));
        assert_eq!(record.requesting_peer_id, None);
    }

    #[test]
    fn transfer_with_correct_owner_id_but_forged_sender_is_rejected() {
        let mut ledger = spawned("e1", "alice", "p1");
        let outcome = ledger.receive(
            &envelope(
                "p9",
                "mallory",
                NetworkAction::transfer_authority(UserId::from("alice"), EntityUuid::from("e1"), PeerId::from("p9")),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance));
        assert_eq!(ledger.get(&EntityUuid::from("e1")).unwrap().authority_peer_id, PeerId::from("p1"));
    }

    #[test]
    fn scene_owned_transfer_accepts_host_provenance() {
        let host_user = UserId::from("server");
        let mut ledger = EntityLedger::new();
        ledger.receive(
            &envelope(
                "host",
                "server",
                NetworkAction::spawn(EntityUuid::from("door"), UserId::scene()),
            ),
            Some(&host_user),
        );
        let outcome = ledger.receive(
            &envelope(
                "host",
                "server",
                NetworkAction::transfer_authority(UserId::scene(), EntityUuid::from("door"), PeerId::from("p1")),
            ),
            Some(&host_user),
        );
        assert_eq!(outcome, ReceptorOutcome::Applied);
    }

    #[test]
    fn clients_cannot_grant_themselves_scene_entities() {
        let host_user = UserId::from("server");
        let mut ledger = EntityLedger::new();
        ledger.receive(
            &envelope(
                "host",
                "server",
                NetworkAction::spawn(EntityUuid::from("door"), UserId::scene()),
            ),
            Some(&host_user),
        );

        let outcome = ledger.receive(
            &envelope(
                "p1",
                "alice",
                NetworkAction::transfer_authority(UserId::scene(), EntityUuid::from("door"), PeerId::from("p1")),
            ),
            Some(&host_user),
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance));

        let outcome = ledger.receive(
            &envelope(
                "p1",
                "alice",
                NetworkAction::SpawnEntity(SpawnEntity {
                    entity_uuid: EntityUuid::from("door"),
                    owner_id: UserId::scene(),
                    network_id: None,
                    authority_peer_id: Some(PeerId::from("p1")),
                }),
            ),
            Some(&host_user),
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::ForgedProvenance));

        let record = ledger.get(&EntityUuid::from("door")).unwrap();
        assert_eq!(record.authority_peer_id, PeerId::from("host"));
        assert_eq!(record.owner_peer, PeerId::from("host"));
    }

    #[test]
    fn peer_updates_are_not_ledger_actions() {
        let mut ledger = EntityLedger::new();
        let outcome = ledger.receive(
            &envelope(
                "host",
                "server",
                NetworkAction::UpdatePeers(netsync_shared::UpdatePeers { peers: Vec::new() }),
            ),
            None,
        );
        assert_eq!(outcome, ReceptorOutcome::Ignored(IgnoreReason::NotALedgerAction));
    }

    #[test]
    fn snapshot_rebuilds_an_identical_replica() {
        let mut ledger = spawned("e1", "alice", "p1");
        ledger.receive(
            &envelope(
                "p1",
                "alice",
                NetworkAction::transfer_authority(UserId::from("alice"), EntityUuid::from("e1"), PeerId::from("p3")),
            ),
            None,
        );
        ledger.receive(
            &envelope(
                "p2",
                "bob",
                NetworkAction::request_authority(EntityUuid::from("e1"), PeerId::from("p2")),
            ),
            None,
        );

        let mut replica = EntityLedger::new();
        for action in ledger.snapshot_actions(NetworkTopic::World) {
            replica.receive(&action, None);
        }
        assert_eq!(replica, ledger);
    }
}
