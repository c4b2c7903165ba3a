//! # fdp_replication
//!
//! Outbound dirty-component diffing and inbound command-buffer application
//! across a [`Transport`] boundary (§4.11).

pub mod driver;
pub mod ownership;
pub mod transport;

pub use driver::ReplicationDriver;
pub use ownership::NetworkOwnership;
pub use transport::{InProcessTransport, Transport, WireMessage};
