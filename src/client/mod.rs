// Module declarations
mod builder;
mod config;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{SignalingClientBuilder, SignalingClientOptions};
pub use config::{AuthenticationConfig, SignalingConfig};
pub use connection::{ConnectionManager, ConnectionState, Session, peer_id_header};
pub use self::core::SignalingClient;
pub use state::ClientState;
