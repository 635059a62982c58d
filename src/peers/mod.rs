// Peers module - Registry of connected peers and the snapshot codec
pub mod registry;
pub mod snapshot;

pub use registry::{PeerChanges, PeerRegistry};
pub use snapshot::PeerSnapshot;
