//! # Entity Lifecycle Types
//!
//! State enums describing how a replicated entity exists on one peer.

use serde::{Deserialize, Serialize};

/// Whether a local representation of a ledger entity currently exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterializationState {
    /// No local entity; either the owner is disconnected or the record is gone
    #[default]
    Absent,

    /// A local entity exists and mirrors the ledger record
    Materialized,
}

/// How the local peer relates to one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityRole {
    /// The local peer may author the entity's state
    Authority,

    /// The local user owns the entity but another peer holds authority
    Owner,

    /// The local peer only observes replicated state
    Observer,
}
