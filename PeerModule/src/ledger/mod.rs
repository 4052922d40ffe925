//! # Entity Ownership Ledger
//!
//! Per-peer replica of ownership and authority metadata, keyed by
//! [`EntityUuid`]. The ledger is read-only to the outside world; records only
//! change through the receptors in [`receptors`], applied during the
//! runtime's "apply incoming actions" phase. Replicas that see the same
//! ordered action stream end up identical.

use std::collections::BTreeMap;

use netsync_shared::{
    ActionEnvelope, EntityUuid, NetworkAction, NetworkId, NetworkTopic, PeerId, SpawnEntity, UserId,
};
use serde::{Deserialize, Serialize};

pub mod receptors;

pub use receptors::{IgnoreReason, ReceptorOutcome};

/// Ownership and authority metadata of one replicated entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecord {
    /// Logical owner; [`UserId::scene`] for scene-owned entities
    pub owner_id: UserId,

    /// Peer that spawned (or last re-spawned) the entity
    pub owner_peer: PeerId,

    /// The one peer allowed to author the entity's state
    pub authority_peer_id: PeerId,

    pub network_id: NetworkId,

    /// Peer waiting for the owner to grant it authority
    pub requesting_peer_id: Option<PeerId>,
}

/// The ownership ledger replica of one peer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityLedger {
    records: BTreeMap<EntityUuid, OwnershipRecord>,
}

impl EntityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_uuid: &EntityUuid) -> Option<&OwnershipRecord> {
        self.records.get(entity_uuid)
    }

    pub fn contains(&self, entity_uuid: &EntityUuid) -> bool {
        self.records.contains_key(entity_uuid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in uuid order
    pub fn iter(&self) -> impl Iterator<Item = (&EntityUuid, &OwnershipRecord)> {
        self.records.iter()
    }

    /// Entities whose authority currently sits with `peer_id`
    pub fn authority_of(&self, peer_id: &PeerId) -> Vec<&EntityUuid> {
        self.records
            .iter()
            .filter(|(_, record)| &record.authority_peer_id == peer_id)
            .map(|(uuid, _)| uuid)
            .collect()
    }

    /// Actions that rebuild this ledger on a fresh replica
    ///
    /// Each record becomes a spawn attributed to its owner peer and carrying
    /// the current authority explicitly; pending requests follow as requests
    /// attributed to the requesting peer. Scene-owned spawns are left
    /// unstamped, since no user but the host's may act for them.
    pub fn snapshot_actions(&self, topic: NetworkTopic) -> Vec<ActionEnvelope> {
        let mut actions = Vec::with_capacity(self.records.len());
        let mut requests = Vec::new();

        for (uuid, record) in &self.records {
            let from = if record.owner_id.is_scene() {
                None
            } else {
                Some(record.owner_id.clone())
            };
            actions.push(ActionEnvelope::new(
                record.owner_peer.clone(),
                from,
                topic,
                NetworkAction::SpawnEntity(SpawnEntity {
                    entity_uuid: uuid.clone(),
                    owner_id: record.owner_id.clone(),
                    network_id: Some(record.network_id),
                    authority_peer_id: Some(record.authority_peer_id.clone()),
                }),
            ));

            if let Some(requesting) = &record.requesting_peer_id {
                requests.push(ActionEnvelope::new(
                    requesting.clone(),
                    None,
                    topic,
                    NetworkAction::request_authority(uuid.clone(), requesting.clone()),
                ));
            }
        }

        actions.extend(requests);
        actions
    }
}
