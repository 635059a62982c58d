use super::snapshot::PeerSnapshot;
use crate::types::{Peer, PeerId};

/// Peers that joined or left between two snapshots.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PeerChanges {
    pub joins: Vec<Peer>,
    pub leaves: Vec<PeerId>,
}

impl PeerChanges {
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.leaves.is_empty()
    }
}

/// In-memory mapping of connected peer id to name.
///
/// Membership is never incremental: every server response is a full snapshot
/// and replaces the registry wholesale, the joins and leaves being computed
/// against the previous snapshot.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    peers: PeerSnapshot,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the registry with `snapshot` and returns what changed.
    pub fn sync_snapshot(&mut self, snapshot: PeerSnapshot) -> PeerChanges {
        let joins = snapshot
            .iter()
            .filter(|(id, _)| !self.peers.contains_key(*id))
            .map(|(id, name)| Peer::new(*id, name.clone()))
            .collect();

        let leaves = self
            .peers
            .keys()
            .filter(|id| !snapshot.contains_key(*id))
            .copied()
            .collect();

        self.peers = snapshot;
        PeerChanges { joins, leaves }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Current peers ordered by id.
    pub fn peers(&self) -> Vec<Peer> {
        self.peers
            .iter()
            .map(|(id, name)| Peer::new(*id, name.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
