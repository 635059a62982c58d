use super::SignalingClientOptions;
use crate::infrastructure::{HttpRequest, HttpResponse, SimpleHttpClient};
use crate::types::{PeerId, Result, SignalingError, endpoints, query_params};
use reqwest::header::{AUTHORIZATION, HeaderValue, PRAGMA};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Identity of a signed-in session: the id assigned at sign-in and the base URI
/// every later call goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: PeerId,
    pub endpoint: Url,
}

impl Session {
    pub fn new(id: PeerId, endpoint: Url) -> Self {
        Self { id, endpoint }
    }
}

/// Issues the signaling protocol calls and tracks the connection state.
pub struct ConnectionManager {
    http: Arc<dyn SimpleHttpClient>,
    options: Arc<RwLock<SignalingClientOptions>>,
    state: RwLock<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(
        http: Arc<dyn SimpleHttpClient>,
        options: Arc<RwLock<SignalingClientOptions>>,
    ) -> Self {
        Self {
            http,
            options,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Gets the current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Sets the connection state
    pub async fn set_state(&self, new_state: ConnectionState) {
        let mut state = self.state.write().await;
        tracing::debug!("Connection state {:?} -> {:?}", *state, new_state);
        *state = new_state;
    }

    /// Moves from `from` to `to` atomically; returns false if the state was not `from`.
    pub async fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let mut state = self.state.write().await;
        if *state != from {
            return false;
        }
        tracing::debug!("Connection state {:?} -> {:?}", from, to);
        *state = to;
        true
    }

    /// Checks if currently connected
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// `GET {base}/sign_in?peer_name={name}`
    pub async fn sign_in(
        &self,
        base: &Url,
        peer_name: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let request = self
            .build_request(base, endpoints::SIGN_IN, &[(query_params::PEER_NAME, peer_name)])
            .await?;
        Ok(self.http.get(&request, cancel).await?)
    }

    /// `GET {endpoint}/sign_out?peer_id={id}`
    pub async fn sign_out(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let request = self.session_request(session, endpoints::SIGN_OUT).await?;
        Ok(self.http.get(&request, cancel).await?)
    }

    /// `GET {endpoint}/wait?peer_id={id}`, held open by the server until it has news.
    pub async fn wait(&self, session: &Session, cancel: &CancellationToken) -> Result<HttpResponse> {
        let request = self.session_request(session, endpoints::WAIT).await?;
        Ok(self.http.get(&request, cancel).await?)
    }

    /// `GET {endpoint}/heartbeat?peer_id={id}`
    pub async fn heartbeat(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let request = self.session_request(session, endpoints::HEARTBEAT).await?;
        Ok(self.http.get(&request, cancel).await?)
    }

    /// `POST {endpoint}/message?peer_id={id}&to={to}` with `body`
    pub async fn send_message(
        &self,
        session: &Session,
        to: PeerId,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let id = session.id.to_string();
        let to = to.to_string();
        let request = self
            .build_request(
                &session.endpoint,
                endpoints::MESSAGE,
                &[(query_params::PEER_ID, &id), (query_params::TO, &to)],
            )
            .await?
            .with_body(body);
        Ok(self.http.post(&request, cancel).await?)
    }

    async fn session_request(&self, session: &Session, path: &str) -> Result<HttpRequest> {
        let id = session.id.to_string();
        self.build_request(&session.endpoint, path, &[(query_params::PEER_ID, &id)])
            .await
    }

    /// Builds `{base}{path}?{params}` carrying the Authorization header.
    ///
    /// The token goes out verbatim; an unset token is sent as an empty value.
    async fn build_request(
        &self,
        base: &Url,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpRequest> {
        let mut uri = base.join(path)?;
        uri.query_pairs_mut().extend_pairs(params);

        let token = self.options.read().await.auth_token.clone().unwrap_or_default();
        let authorization = HeaderValue::from_str(&token)?;

        Ok(HttpRequest::new(uri).with_header(AUTHORIZATION, authorization))
    }
}

/// Reads the peer id the server carries in the `Pragma` response header.
pub fn peer_id_header(response: &HttpResponse) -> Result<PeerId> {
    let value = response
        .headers
        .get(PRAGMA)
        .ok_or_else(|| SignalingError::InvalidPeerId("missing Pragma header".to_string()))?;

    let text = value
        .to_str()
        .map_err(|e| SignalingError::InvalidPeerId(e.to_string()))?;

    text.trim()
        .parse::<PeerId>()
        .map_err(|e| SignalingError::InvalidPeerId(format!("'{}': {}", text, e)))
}
