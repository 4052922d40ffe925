//! # Connection Types
//!
//! Shared connection-related types used by both peers and the server:
//! network topics, data channel names, replicated peer summaries and
//! disconnect reasons.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PeerId, PeerIndex, UserId, UserIndex};

/// Logical network a peer or action belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkTopic {
    /// The world network carrying entity state
    #[default]
    World,

    /// The media network carrying audio/video signaling
    Media,
}

impl fmt::Display for NetworkTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkTopic::World => f.write_str("world"),
            NetworkTopic::Media => f.write_str("media"),
        }
    }
}

/// Name of a negotiated data channel (e.g. the transform stream)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataChannelType(String);

impl DataChannelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataChannelType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One peer as announced by the server in a peer list update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSummary {
    #[serde(rename = "peerID")]
    pub peer_id: PeerId,

    pub peer_index: PeerIndex,

    #[serde(rename = "userID")]
    pub user_id: UserId,

    pub user_index: UserIndex,
}

/// The reason a peer left a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Normal disconnection requested by the peer
    ClientRequest,

    /// No heartbeat within the configured timeout
    Timeout,

    /// Kicked by server or admin
    Kicked(String),

    /// The underlying transport closed with an error
    TransportError(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::ClientRequest => f.write_str("client request"),
            DisconnectReason::Timeout => f.write_str("heartbeat timeout"),
            DisconnectReason::Kicked(why) => write!(f, "kicked: {}", why),
            DisconnectReason::TransportError(err) => write!(f, "transport error: {}", err),
        }
    }
}
