use crate::client::{ConnectionManager, Session};
use crate::messaging::{EventEmitter, SignalingEvent};
use crate::types::Result;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(5000);

/// Keeps the session's presence alive by hitting `/heartbeat` periodically.
pub struct HeartbeatManager {
    interval: Duration,
    connection: Weak<ConnectionManager>,
    session: Session,
    events: EventEmitter,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ConnectionManager>, session: Session, events: EventEmitter) -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            connection,
            session,
            events,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Runs until cancelled, the client is dropped, or the transport fails.
    ///
    /// Transport failures are reported as `ConnectionFailure` and end the loop
    /// without an error, so stopping the task later still succeeds.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut interval_timer = time::interval(self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            let connection = match self.connection.upgrade() {
                Some(conn) => conn,
                None => {
                    // Client dropped, exit heartbeat task
                    break;
                }
            };

            match connection.heartbeat(&self.session, &cancel).await {
                Ok(response) if response.is_ok() => {
                    tracing::debug!("Heartbeat for peer {} acknowledged", self.session.id);
                }
                Ok(response) => {
                    tracing::warn!("Heartbeat returned status {}", response.status);
                }
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::error!("[Heartbeat] Failed to send: {}", e);
                    self.events.emit(SignalingEvent::ConnectionFailure(Arc::new(e)));
                    break;
                }
            }
        }

        tracing::debug!("Heartbeat loop finished");
        Ok(())
    }
}
