use super::connection::Session;
use crate::infrastructure::TaskManager;
use tokio_util::sync::CancellationToken;

/// Consolidated mutable state for SignalingClient
pub struct ClientState {
    /// Active session; `Some` exactly while connected
    pub session: Option<Session>,

    /// Background wait/heartbeat tasks of the active session
    pub task_manager: TaskManager,
}

impl ClientState {
    pub fn new(lifetime: CancellationToken) -> Self {
        Self {
            session: None,
            task_manager: TaskManager::with_parent(lifetime),
        }
    }
}
