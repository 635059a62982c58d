use super::{EventEmitter, SignalingEvent};
use crate::peers::{PeerRegistry, snapshot};
use crate::types::{PeerId, SignalingMessage};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Turns sign-in and wait responses into registry updates and events.
///
/// Only one router is active per session and it is driven by one caller at a
/// time (sign-in, then the wait loop), so registry updates are serialized.
pub struct MessageRouter {
    self_id: PeerId,
    registry: Arc<RwLock<PeerRegistry>>,
    events: EventEmitter,
}

impl MessageRouter {
    pub fn new(self_id: PeerId, registry: Arc<RwLock<PeerRegistry>>, events: EventEmitter) -> Self {
        Self {
            self_id,
            registry,
            events,
        }
    }

    /// Routes a response body tagged with the id from its peer id header.
    pub async fn route(&self, message: SignalingMessage) {
        // Not our id: a peer relayed this through the server
        if message.is_from_peer(self.self_id) {
            if message.is_hangup() {
                tracing::info!("Peer {} hung up", message.id);
                self.events.emit(SignalingEvent::PeerHangup(message.id));
            } else {
                tracing::debug!("Message from peer {} ({} bytes)", message.id, message.body.len());
                self.events.emit(SignalingEvent::MessageFromPeer {
                    id: message.id,
                    body: message.body.clone(),
                });
            }
        }

        let snapshot = snapshot::parse(&message.body, self.self_id);
        let changes = self.registry.write().await.sync_snapshot(snapshot);

        for peer in changes.joins {
            tracing::info!("Peer connected: {} ({})", peer.name, peer.id);
            self.events.emit(SignalingEvent::PeerConnected {
                id: peer.id,
                name: peer.name,
            });
        }

        for id in changes.leaves {
            tracing::info!("Peer disconnected: {}", id);
            self.events.emit(SignalingEvent::PeerDisconnected(id));
        }
    }
}
