//! # Netsync Peer Module
//!
//! The per-peer replica of the entity authority protocol. Every peer, the
//! server's host peer included, runs one [`PeerRuntime`]: an ownership ledger
//! fed by receptors, a registry of the networks it belongs to, and a
//! reconciliation reactor turning ledger records into local entities.
//!
//! The system is organized into several sub-modules:
//! - `network`: Peer registry per logical network
//! - `ledger`: Ownership ledger and its receptors
//! - `queue`: Inbound action inbox and outgoing batch
//! - `context`: Local session (user, peer, networks) and action dispatch
//! - `reactor`: Per-entity reconciliation, authority arbitration and failover
//! - `runtime`: Tick driver tying the above together

// Module declarations
pub mod network;     // Peer registry
pub mod ledger;      // Ownership ledger
pub mod queue;       // Action inbox/outbox
pub mod context;     // Session context
pub mod reactor;     // Reconciliation reactor
pub mod runtime;     // Tick driver

// Re-export commonly used items
pub use network::{ActiveNetwork, Network, NetworkPeer, NetworkRegistry};
pub use ledger::{EntityLedger, IgnoreReason, OwnershipRecord, ReceptorOutcome};
pub use queue::{ActionQueue, ActionSender};
pub use context::PeerContext;
pub use reactor::{Entity, LocalEntities, LocalEntity, NetworkObject, ReconcileEvent, Reconciler};
pub use runtime::{ApplyReport, PeerRuntime, TickReport};
