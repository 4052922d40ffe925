//! # Network Actions
//!
//! Wire-level contract of the authority protocol. Every action is a
//! discriminated message tagged with its wire name, wrapped in an
//! [`ActionEnvelope`] that carries provenance (`$peer`, `$from`) and the
//! network topic it applies to.

use serde::{Deserialize, Serialize};

use crate::connection::{NetworkTopic, PeerSummary};
use crate::types::{EntityUuid, NetworkId, PeerId, UserId};

/// Replicate an entity (first spawn or failover re-spawn)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntity {
    #[serde(rename = "entityUUID")]
    pub entity_uuid: EntityUuid,

    #[serde(rename = "ownerID")]
    pub owner_id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<NetworkId>,

    /// Explicit authority holder; absent means "the spawning peer" for a new
    /// record and "unchanged" for an existing one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_peer_id: Option<PeerId>,
}

/// Ask the owner to hand authority to `new_authority`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAuthorityOverObject {
    #[serde(rename = "entityUUID")]
    pub entity_uuid: EntityUuid,

    pub new_authority: PeerId,
}

/// Owner grant of authority to `new_authority`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAuthorityOfObject {
    #[serde(rename = "ownerID")]
    pub owner_id: UserId,

    #[serde(rename = "entityUUID")]
    pub entity_uuid: EntityUuid,

    pub new_authority: PeerId,
}

/// Remove an entity from every replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestroyEntity {
    #[serde(rename = "entityUUID")]
    pub entity_uuid: EntityUuid,
}

/// Full peer list of one network, broadcast by the server on churn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePeers {
    pub peers: Vec<PeerSummary>,
}

/// All actions understood by the receptor pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NetworkAction {
    #[serde(rename = "spawnEntity")]
    SpawnEntity(SpawnEntity),

    #[serde(rename = "requestAuthorityOverObject")]
    RequestAuthorityOverObject(RequestAuthorityOverObject),

    #[serde(rename = "transferAuthorityOfObject")]
    TransferAuthorityOfObject(TransferAuthorityOfObject),

    #[serde(rename = "destroyEntity")]
    DestroyEntity(DestroyEntity),

    #[serde(rename = "updatePeers")]
    UpdatePeers(UpdatePeers),
}

impl NetworkAction {
    /// Wire name of the action
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkAction::SpawnEntity(_) => "spawnEntity",
            NetworkAction::RequestAuthorityOverObject(_) => "requestAuthorityOverObject",
            NetworkAction::TransferAuthorityOfObject(_) => "transferAuthorityOfObject",
            NetworkAction::DestroyEntity(_) => "destroyEntity",
            NetworkAction::UpdatePeers(_) => "updatePeers",
        }
    }

    /// The entity this action targets, if any
    pub fn entity_uuid(&self) -> Option<&EntityUuid> {
        match self {
            NetworkAction::SpawnEntity(a) => Some(&a.entity_uuid),
            NetworkAction::RequestAuthorityOverObject(a) => Some(&a.entity_uuid),
            NetworkAction::TransferAuthorityOfObject(a) => Some(&a.entity_uuid),
            NetworkAction::DestroyEntity(a) => Some(&a.entity_uuid),
            NetworkAction::UpdatePeers(_) => None,
        }
    }

    pub fn spawn(entity_uuid: EntityUuid, owner_id: UserId) -> Self {
        NetworkAction::SpawnEntity(SpawnEntity {
            entity_uuid,
            owner_id,
            network_id: None,
            authority_peer_id: None,
        })
    }

    pub fn request_authority(entity_uuid: EntityUuid, new_authority: PeerId) -> Self {
        NetworkAction::RequestAuthorityOverObject(RequestAuthorityOverObject {
            entity_uuid,
            new_authority,
        })
    }

    pub fn transfer_authority(owner_id: UserId, entity_uuid: EntityUuid, new_authority: PeerId) -> Self {
        NetworkAction::TransferAuthorityOfObject(TransferAuthorityOfObject {
            owner_id,
            entity_uuid,
            new_authority,
        })
    }

    pub fn destroy(entity_uuid: EntityUuid) -> Self {
        NetworkAction::DestroyEntity(DestroyEntity { entity_uuid })
    }
}

/// An action plus the provenance attached by the sender or the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Peer the action originated from
    #[serde(rename = "$peer")]
    pub peer: PeerId,

    /// User behind `peer`, when known
    #[serde(rename = "$from", default, skip_serializing_if = "Option::is_none")]
    pub from: Option<UserId>,

    /// Network the action applies to
    #[serde(rename = "$topic", default)]
    pub topic: NetworkTopic,

    #[serde(flatten)]
    pub action: NetworkAction,
}

impl ActionEnvelope {
    pub fn new(peer: PeerId, from: Option<UserId>, topic: NetworkTopic, action: NetworkAction) -> Self {
        Self {
            peer,
            from,
            topic,
            action,
        }
    }
}
