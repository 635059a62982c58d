use crate::client::{ConnectionManager, Session, peer_id_header};
use crate::messaging::{EventEmitter, MessageRouter, SignalingEvent};
use crate::types::{Result, SignalingMessage};
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;

/// Long-polls `/wait` for the lifetime of a session.
///
/// Each response is fully routed before the next poll is issued, so registry
/// updates never overlap.
pub struct WaitManager {
    connection: Weak<ConnectionManager>,
    session: Session,
    router: MessageRouter,
    events: EventEmitter,
}

impl WaitManager {
    pub fn new(
        connection: Weak<ConnectionManager>,
        session: Session,
        router: MessageRouter,
        events: EventEmitter,
    ) -> Self {
        Self {
            connection,
            session,
            router,
            events,
        }
    }

    /// Re-arms the long-poll after every 200 response until cancelled.
    ///
    /// A non-200 status, or a 200 without a usable peer id, is logged and ends
    /// the loop. Transport failures are
    /// reported as `ConnectionFailure` and end the loop without an error.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        loop {
            let Some(connection) = self.connection.upgrade() else {
                // Client dropped
                break;
            };

            let response = match connection.wait(&self.session, &cancel).await {
                Ok(response) => response,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::error!("Wait request failed: {}", e);
                    self.events.emit(SignalingEvent::ConnectionFailure(Arc::new(e)));
                    break;
                }
            };
            drop(connection);

            if !response.is_ok() {
                tracing::warn!("Dropping wait response with status {}", response.status);
                break;
            }

            let id = match peer_id_header(&response) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Dropping wait response: {}", e);
                    break;
                }
            };

            self.router
                .route(SignalingMessage::new(id, response.body_str()))
                .await;
        }

        tracing::debug!("Wait loop finished for peer {}", self.session.id);
        Ok(())
    }
}
