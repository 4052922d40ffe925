//! # Owner-Peer Failover
//!
//! When the peer that spawned an entity leaves, exactly one remaining peer of
//! the owning user re-spawns it: the one with the lowest peer id.

use netsync_shared::{EntityUuid, NetworkAction, PeerId, SpawnEntity, UserId};

use crate::ledger::OwnershipRecord;
use crate::network::Network;

/// Lowest peer id among `candidates`, skipping `departed`
pub fn elect_leader<'a>(
    candidates: impl IntoIterator<Item = &'a PeerId>,
    departed: &PeerId,
) -> Option<&'a PeerId> {
    candidates.into_iter().filter(|peer| *peer != departed).min()
}

/// The re-spawn the local peer must dispatch, if it is the elected leader
///
/// Liveness is read from `network` at the moment of the decision, and the
/// local peer must itself still be registered. Authority is only reassigned
/// to the leader when the current authority peer has left as well.
pub fn plan_respawn(
    network: &Network,
    entity_uuid: &EntityUuid,
    record: &OwnershipRecord,
    owner: &UserId,
    local_peer: &PeerId,
) -> Option<NetworkAction> {
    if !network.contains_peer(local_peer) {
        return None;
    }

    let leader = elect_leader(network.user_peers(owner), &record.owner_peer)?;
    if leader != local_peer {
        return None;
    }

    let authority_gone = !network.contains_peer(&record.authority_peer_id);
    Some(NetworkAction::SpawnEntity(SpawnEntity {
        entity_uuid: entity_uuid.clone(),
        owner_id: record.owner_id.clone(),
        network_id: Some(record.network_id),
        authority_peer_id: authority_gone.then(|| local_peer.clone()),
    }))
}

#[cfg(test)]
mod tests {
    use netsync_shared::{NetworkId, NetworkTopic};

    use super::*;

    #[test]
    fn lowest_remaining_peer_wins() {
        let peers = [PeerId::from("b"), PeerId::from("a"), PeerId::from("c")];
        assert_eq!(elect_leader(&peers, &PeerId::from("b")), Some(&PeerId::from("a")));
        assert_eq!(elect_leader(&peers, &PeerId::from("a")), Some(&PeerId::from("b")));
        assert_eq!(elect_leader(&[PeerId::from("a")], &PeerId::from("a")), None);
    }

    fn network_with(peers: &[(&str, &str)]) -> Network {
        let mut network = Network::new("w", NetworkTopic::World, None);
        for (peer, user) in peers {
            network.add_peer(PeerId::from(*peer), UserId::from(*user), 0);
        }
        network
    }

    fn record(owner_peer: &str, authority: &str) -> OwnershipRecord {
        OwnershipRecord {
            owner_id: UserId::from("alice"),
            owner_peer: PeerId::from(owner_peer),
            authority_peer_id: PeerId::from(authority),
            network_id: NetworkId(3),
            requesting_peer_id: None,
        }
    }

    #[test]
    fn only_the_leader_plans_a_respawn() {
        let network = network_with(&[("a", "alice"), ("c", "alice")]);
        let uuid = EntityUuid::from("e1");
        let owner = UserId::from("alice");
        let record = record("b", "b");

        assert!(plan_respawn(&network, &uuid, &record, &owner, &PeerId::from("c")).is_none());

        match plan_respawn(&network, &uuid, &record, &owner, &PeerId::from("a")) {
            Some(NetworkAction::SpawnEntity(spawn)) => {
                assert_eq!(spawn.network_id, Some(NetworkId(3)));
                assert_eq!(spawn.authority_peer_id, Some(PeerId::from("a")));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn live_authority_is_preserved() {
        let network = network_with(&[("a", "alice"), ("bob-1", "bob")]);
        let plan = plan_respawn(
            &network,
            &EntityUuid::from("e1"),
            &record("b", "bob-1"),
            &UserId::from("alice"),
            &PeerId::from("a"),
        );
        match plan {
            Some(NetworkAction::SpawnEntity(spawn)) => assert_eq!(spawn.authority_peer_id, None),
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn unregistered_local_peer_never_leads() {
        let network = network_with(&[("c", "alice")]);
        let plan = plan_respawn(
            &network,
            &EntityUuid::from("e1"),
            &record("b", "b"),
            &UserId::from("alice"),
            &PeerId::from("a"),
        );
        assert!(plan.is_none());
    }
}
