//! # Local Entities
//!
//! Index + generation arena holding the local materializations of ledger
//! entities. Handles of destroyed entities go stale instead of aliasing the
//! next entity placed in the same slot.

use std::collections::HashMap;

use netsync_shared::{EntityUuid, NetworkId, PeerId, UserId};

/// Handle of a local entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Network descriptor applied to a materialized entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkObject {
    /// Resolved owner; never the scene pseudo-user
    pub owner_id: UserId,
    pub owner_peer: PeerId,
    pub authority_peer_id: PeerId,
    pub network_id: NetworkId,
}

/// One materialized entity
#[derive(Debug, Clone)]
pub struct LocalEntity {
    pub entity_uuid: EntityUuid,
    pub network_object: Option<NetworkObject>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    occupant: Option<LocalEntity>,
}

/// Arena of local entities
#[derive(Debug, Clone, Default)]
pub struct LocalEntities {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_uuid: HashMap<EntityUuid, Entity>,
}

impl LocalEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the local entity for `entity_uuid`, or return the existing one
    pub fn create(&mut self, entity_uuid: &EntityUuid) -> Entity {
        if let Some(entity) = self.by_uuid.get(entity_uuid) {
            return *entity;
        }

        let occupant = LocalEntity {
            entity_uuid: entity_uuid.clone(),
            network_object: None,
        };
        let entity = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.occupant = Some(occupant);
                Entity {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    occupant: Some(occupant),
                });
                Entity {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };

        self.by_uuid.insert(entity_uuid.clone(), entity);
        entity
    }

    /// Destroy the local entity for `entity_uuid`, if any
    pub fn destroy(&mut self, entity_uuid: &EntityUuid) -> Option<Entity> {
        let entity = self.by_uuid.remove(entity_uuid)?;
        let slot = &mut self.slots[entity.index as usize];
        slot.occupant = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(entity.index);
        Some(entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&LocalEntity> {
        self.slots
            .get(entity.index as usize)
            .filter(|slot| slot.generation == entity.generation)
            .and_then(|slot| slot.occupant.as_ref())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    pub fn entity_for(&self, entity_uuid: &EntityUuid) -> Option<Entity> {
        self.by_uuid.get(entity_uuid).copied()
    }

    pub fn network_object(&self, entity_uuid: &EntityUuid) -> Option<&NetworkObject> {
        let entity = self.entity_for(entity_uuid)?;
        self.get(entity).and_then(|local| local.network_object.as_ref())
    }

    /// Attach a descriptor; false if the entity is not materialized
    pub fn set_network_object(&mut self, entity_uuid: &EntityUuid, network_object: NetworkObject) -> bool {
        let entity = match self.by_uuid.get(entity_uuid) {
            Some(entity) => *entity,
            None => return false,
        };
        match self.slots[entity.index as usize].occupant.as_mut() {
            Some(local) => {
                local.network_object = Some(network_object);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uuid.is_empty()
    }
}
