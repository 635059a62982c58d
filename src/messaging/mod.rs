// Messaging module - Event surface and response routing
pub mod event;
pub mod router;

pub use event::{EventEmitter, SignalingEvent};
pub use router::MessageRouter;
