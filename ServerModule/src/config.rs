//! # Transport Configuration
//!
//! Parameters of one server transport instance. Built in code or parsed from
//! the JSON connection parameters handed over by the hosting process.

use netsync_shared::constants::network::DEFAULT_PEER_TIMEOUT_MS;
use netsync_shared::{NetworkTopic, PeerId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};

/// User the host runtime acts as unless configured otherwise
pub const DEFAULT_HOST_USER: &str = "server";

/// Configuration for a server transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Identifier of the network instance served
    pub instance_id: String,

    /// Peer id of the server itself
    pub host_peer_id: PeerId,

    /// User the host peer runs as; arbitrates scene-owned entities
    pub host_user_id: UserId,

    /// Network role served by this transport
    pub topic: NetworkTopic,

    /// Silence after which a peer is evicted (in milliseconds)
    pub peer_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            instance_id: String::new(),
            host_peer_id: PeerId::new(""),
            host_user_id: UserId::new(DEFAULT_HOST_USER),
            topic: NetworkTopic::World,
            peer_timeout_ms: DEFAULT_PEER_TIMEOUT_MS,
        }
    }
}

impl TransportConfig {
    pub fn new(instance_id: impl Into<String>, host_peer_id: PeerId, topic: NetworkTopic) -> Self {
        Self {
            instance_id: instance_id.into(),
            host_peer_id,
            topic,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> TransportResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TransportError::Config(format!("Failed to parse transport config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TransportResult<()> {
        if self.instance_id.is_empty() {
            return Err(TransportError::Config("instance_id must not be empty".to_string()));
        }
        if self.host_peer_id.as_str().is_empty() {
            return Err(TransportError::Config("host_peer_id must not be empty".to_string()));
        }
        if self.host_user_id.is_scene() {
            return Err(TransportError::Config(
                "host_user_id must name a concrete user".to_string(),
            ));
        }
        if self.peer_timeout_ms == 0 {
            return Err(TransportError::Config(
                "peer_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
