use super::{ClientState, ConnectionManager, SignalingClient};
use crate::infrastructure::{ReqwestHttpClient, SimpleHttpClient};
use crate::messaging::EventEmitter;
use crate::peers::PeerRegistry;
use crate::types::Result;
use reqwest::header::HeaderValue;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalingClientOptions {
    /// Value placed verbatim in every Authorization header (empty when `None`)
    pub auth_token: Option<String>,
    /// Heartbeat period in milliseconds; `None` disables the heartbeat task
    pub heartbeat_interval: Option<u64>,
}

/// Builder for SignalingClient that handles initialization
pub struct SignalingClientBuilder {
    options: SignalingClientOptions,
    http: Option<Arc<dyn SimpleHttpClient>>,
}

impl SignalingClientBuilder {
    /// Create a new builder
    pub fn new(options: SignalingClientOptions) -> Result<Self> {
        // Fail early rather than on the first request
        if let Some(token) = &options.auth_token {
            HeaderValue::from_str(token)?;
        }

        Ok(Self {
            options,
            http: None,
        })
    }

    /// Use a custom transport instead of the reqwest-backed one
    pub fn http_client(mut self, http: Arc<dyn SimpleHttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client
    pub fn build(self) -> SignalingClient {
        let http = self
            .http
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let options = Arc::new(RwLock::new(self.options));
        let lifetime = CancellationToken::new();

        SignalingClient {
            connection: Arc::new(ConnectionManager::new(http, Arc::clone(&options))),
            options,
            state: Arc::new(RwLock::new(ClientState::new(lifetime.clone()))),
            peers: Arc::new(RwLock::new(PeerRegistry::new())),
            events: EventEmitter::new(),
            lifetime,
        }
    }
}
