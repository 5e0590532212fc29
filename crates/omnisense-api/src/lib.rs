// omnisense-api: Async transport for the OmniSense dispatch backend (snapshot feed + REST actions)

pub mod client;
pub mod error;
pub mod transport;
pub mod websocket;

pub use client::{DispatchClient, Endpoints, HealthReport};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{FeedEvent, ReconnectConfig, SnapshotFeed};
