/// Signaling server endpoint paths (magic strings layer)
pub mod endpoints {
    pub const SIGN_IN: &str = "/sign_in";
    pub const SIGN_OUT: &str = "/sign_out";
    pub const WAIT: &str = "/wait";
    pub const HEARTBEAT: &str = "/heartbeat";
    pub const MESSAGE: &str = "/message";
}

/// Query parameter names used by the signaling endpoints
pub mod query_params {
    pub const PEER_NAME: &str = "peer_name";
    pub const PEER_ID: &str = "peer_id";
    pub const TO: &str = "to";
}

/// Identifier assigned to a peer by the signaling server.
pub type PeerId = i32;

/// Value of the current id while the client is not connected
pub const DISCONNECTED_ID: PeerId = -1;

/// Heartbeat interval value that disables the heartbeat task
pub const HEARTBEAT_DISABLED: Option<u64> = None;

/// Peer message payload that signals a hangup instead of a message
pub const HANGUP_MESSAGE: &str = "BYE";

/// `connected` flag value marking a listed peer as present
pub const PEER_CONNECTED_FLAG: &str = "1";

/// Default signaling server port (peerconnection_server convention)
pub const DEFAULT_PORT: u16 = 8888;
