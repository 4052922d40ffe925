//! # Netsync Server Module
//!
//! Server role of the entity authority protocol. The server hosts one peer
//! runtime per network instance, registers peers as they connect, relays
//! their actions to each other and fans buffered data channel messages out
//! to everyone on the topic.
//!
//! The system is organized into several sub-modules:
//! - `config`: Transport configuration and validation
//! - `error`: Transport error type
//! - `transport`: Bootstrap, inbound decoding, relay and data channel fan-out
//! - `connection`: Peer join/leave handling and the liveness sweep

// Module declarations
pub mod config;      // Transport configuration
pub mod error;       // Error types
pub mod transport;   // Server transport
pub mod connection;  // Connection management

// Re-export commonly used items
pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use transport::{ActionSink, DataProducer, ServerTransport};
