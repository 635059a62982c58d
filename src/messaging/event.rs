use crate::types::{PeerId, SignalingError};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Notifications raised by the signaling client.
#[derive(Debug, Clone)]
pub enum SignalingEvent {
    /// Signaling could not be established or maintained
    ConnectionFailure(Arc<SignalingError>),

    /// Sign-in succeeded
    Connected,

    /// Sign-out succeeded and background work has stopped
    Disconnected,

    /// A peer appeared in the snapshot
    PeerConnected { id: PeerId, name: String },

    /// A peer vanished from the snapshot
    PeerDisconnected(PeerId),

    /// A peer sent the hangup payload
    PeerHangup(PeerId),

    /// A peer relayed a message through the server
    MessageFromPeer { id: PeerId, body: String },
}

impl SignalingEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionFailure(_) => "connection_failure",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::PeerConnected { .. } => "peer_connected",
            Self::PeerDisconnected(_) => "peer_disconnected",
            Self::PeerHangup(_) => "peer_hangup",
            Self::MessageFromPeer { .. } => "message_from_peer",
        }
    }
}

impl std::fmt::Display for SignalingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fans events out to every subscriber, in emission order.
#[derive(Debug, Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<Mutex<Vec<mpsc::UnboundedSender<SignalingEvent>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SignalingEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live listener, pruning closed ones.
    pub fn emit(&self, event: SignalingEvent) {
        tracing::debug!("Emitting {} event", event);
        self.lock().retain(|listener| {
            let delivered = listener.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!("Dropping closed event listener");
            }
            delivered
        });
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<SignalingEvent>>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}
