//! Text codec for the peer snapshot carried in sign-in and wait bodies.
//!
//! A snapshot is a list of newline-separated `name,id,connected` records.
//! Parsing is tolerant: records that don't split into exactly three fields, or
//! whose id/flag aren't integers, are skipped.

use crate::types::{PEER_CONNECTED_FLAG, Peer, PeerId};
use std::collections::BTreeMap;

/// Connected peers keyed by id.
pub type PeerSnapshot = BTreeMap<PeerId, String>;

/// Parses `body` into the set of connected peers, excluding `self_id`.
pub fn parse(body: &str, self_id: PeerId) -> PeerSnapshot {
    body.split('\n')
        .filter_map(parse_record)
        .filter(|(id, _, connected)| *connected && *id != self_id)
        .map(|(id, name, _)| (id, name))
        .collect()
}

fn parse_record(line: &str) -> Option<(PeerId, String, bool)> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let [name, id, flag] = fields.as_slice() else {
        return None;
    };

    let id = match id.parse::<PeerId>() {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("Skipping peer record with invalid id '{}': {}", id, e);
            return None;
        }
    };
    if flag.parse::<i64>().is_err() {
        tracing::debug!("Skipping peer record with invalid flag '{}'", flag);
        return None;
    }

    Some((id, name.to_string(), *flag == PEER_CONNECTED_FLAG))
}

/// Encodes peers as a snapshot body, every peer marked connected.
pub fn encode<'a>(peers: impl IntoIterator<Item = &'a Peer>) -> String {
    peers
        .into_iter()
        .map(|peer| format!("{},{},{}\n", peer.name, peer.id, PEER_CONNECTED_FLAG))
        .collect()
}
