use super::constants::{HANGUP_MESSAGE, PeerId};

/// A peer listed as present by the signaling server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
}

impl Peer {
    pub fn new(id: PeerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A response body paired with the id the server put in its peer id header.
///
/// When `id` is our own id the body is a peer snapshot; otherwise it was relayed
/// from the peer with that id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingMessage {
    pub id: PeerId,
    pub body: String,
}

impl SignalingMessage {
    pub fn new(id: PeerId, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
        }
    }

    /// Whether the message was sent by another peer rather than the server.
    pub fn is_from_peer(&self, self_id: PeerId) -> bool {
        self.id != self_id
    }

    /// Whether the whole body is the hangup payload.
    pub fn is_hangup(&self) -> bool {
        self.body == HANGUP_MESSAGE
    }
}
