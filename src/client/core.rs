use super::{
    ClientState, ConnectionManager, ConnectionState, Session, SignalingClientBuilder,
    SignalingClientOptions, peer_id_header,
};
use crate::infrastructure::{HeartbeatManager, HttpError, SimpleHttpClient, WaitManager};
use crate::messaging::{EventEmitter, MessageRouter, SignalingEvent};
use crate::peers::PeerRegistry;
use crate::types::{
    DISCONNECTED_ID, HANGUP_MESSAGE, Peer, PeerId, Result, SignalingError, SignalingMessage,
};
use reqwest::header::HeaderValue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Client for a long-poll HTTP signaling server.
///
/// `SignalingClient` signs a named peer in, keeps its presence alive with an
/// optional heartbeat and long-polls `/wait` for peer list updates and relayed
/// messages. Everything it learns is published as [`SignalingEvent`]s to the
/// receivers returned by [`subscribe()`](Self::subscribe).
///
/// Handles are cheap to clone and share the same connection.
///
/// # Example
///
/// ```no_run
/// use peer_signaling::{SignalingClient, SignalingClientOptions, SignalingEvent};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = SignalingClient::new(SignalingClientOptions {
///     heartbeat_interval: Some(5000),
///     ..Default::default()
/// })?;
/// let mut events = client.subscribe();
///
/// if client.connect(&Url::parse("http://localhost:8888")?, "renderer").await? {
///     while let Some(event) = events.recv().await {
///         if let SignalingEvent::PeerConnected { id, .. } = event {
///             client.send_to_peer(id, "hello").await?;
///             break;
///         }
///     }
///     client.disconnect().await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SignalingClient {
    pub(crate) connection: Arc<ConnectionManager>,
    pub(crate) options: Arc<RwLock<SignalingClientOptions>>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) peers: Arc<RwLock<PeerRegistry>>,
    pub(crate) events: EventEmitter,

    // Cancelled by shutdown(); parent of every request and background task token
    pub(crate) lifetime: CancellationToken,
}

impl SignalingClient {
    /// Creates a client using the reqwest transport. No request is made until
    /// [`connect()`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`SignalingError::InvalidHeader`] if the authentication token
    /// cannot be sent as a header value.
    pub fn new(options: SignalingClientOptions) -> Result<Self> {
        SignalingClientBuilder::new(options).map(|builder| builder.build())
    }

    /// Creates a client on top of a custom transport.
    pub fn with_http_client(
        http: Arc<dyn SimpleHttpClient>,
        options: SignalingClientOptions,
    ) -> Result<Self> {
        SignalingClientBuilder::new(options).map(|builder| builder.http_client(http).build())
    }

    /// Registers a listener for every event raised from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SignalingEvent> {
        self.events.subscribe()
    }

    /// Signs in to the server at `uri` as `name`.
    ///
    /// On a 200 response the id carried in the `Pragma` header becomes
    /// [`current_id()`](Self::current_id), peers listed in the body are reported
    /// as `PeerConnected`, `Connected` is raised and the wait (and, when
    /// enabled, heartbeat) tasks start.
    ///
    /// A bad status or a transport failure is not an error: it raises a single
    /// `ConnectionFailure` event and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - [`SignalingError::AlreadyConnected`] if a session is active or being opened
    /// - [`SignalingError::InvalidPeerId`] if a 200 response carries no usable id
    /// - a cancellation error if [`shutdown()`](Self::shutdown) interrupted the call
    pub async fn connect(&self, uri: &Url, name: &str) -> Result<bool> {
        if self.lifetime.is_cancelled() {
            return Err(SignalingError::Cancelled);
        }
        if !self
            .connection
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
            .await
        {
            return Err(SignalingError::AlreadyConnected);
        }

        tracing::info!("Signing in to {} as '{}'", uri, name);
        match self.sign_in(uri, name).await {
            Ok(connected) => Ok(connected),
            Err(e) => {
                tracing::error!("Sign-in failed: {}", e);
                self.connection.set_state(ConnectionState::Disconnected).await;
                Err(e)
            }
        }
    }

    async fn sign_in(&self, uri: &Url, name: &str) -> Result<bool> {
        let cancel = self.lifetime.child_token();

        let response = match self.connection.sign_in(uri, name, &cancel).await {
            Ok(response) => response,
            Err(e @ SignalingError::Http(HttpError::Transport(_))) => {
                self.fail_connection(e).await;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if !response.is_ok() {
            self.fail_connection(SignalingError::InvalidStatus(response.status))
                .await;
            return Ok(false);
        }

        let id = peer_id_header(&response)?;
        if self.lifetime.is_cancelled() {
            return Err(SignalingError::Cancelled);
        }

        let mut state = self.state.write().await;
        let session = Session::new(id, uri.clone());
        state.session = Some(session.clone());

        // Every peer in the first snapshot is new
        self.peers.write().await.clear();
        let router = MessageRouter::new(id, Arc::clone(&self.peers), self.events.clone());
        router
            .route(SignalingMessage::new(id, response.body_str()))
            .await;

        self.connection.set_state(ConnectionState::Connected).await;
        tracing::info!("Signed in as peer {}", id);
        self.events.emit(SignalingEvent::Connected);

        self.start_background_tasks(&mut state, session, router)
            .await;
        Ok(true)
    }

    async fn fail_connection(&self, error: SignalingError) {
        tracing::error!("Connection to signaling server failed: {}", error);
        self.connection.set_state(ConnectionState::Disconnected).await;
        self.events
            .emit(SignalingEvent::ConnectionFailure(Arc::new(error)));
    }

    async fn start_background_tasks(
        &self,
        state: &mut ClientState,
        session: Session,
        router: MessageRouter,
    ) {
        let wait = WaitManager::new(
            Arc::downgrade(&self.connection),
            session.clone(),
            router,
            self.events.clone(),
        );
        state.task_manager.spawn("wait", move |token| wait.run(token));

        match self.heartbeat_interval().await.filter(|ms| *ms > 0) {
            Some(ms) => {
                let heartbeat = HeartbeatManager::new(
                    Arc::downgrade(&self.connection),
                    session,
                    self.events.clone(),
                )
                .with_interval(Duration::from_millis(ms));
                state
                    .task_manager
                    .spawn("heartbeat", move |token| heartbeat.run(token));
            }
            None => tracing::debug!("Heartbeat disabled"),
        }
    }

    /// Signs out and stops the background tasks.
    ///
    /// On a 200 response both tasks are cancelled and awaited before the
    /// session is cleared and `Disconnected` is raised, so no event from the
    /// old session can arrive afterwards. A non-200 response leaves the client
    /// connected and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// - [`SignalingError::NotConnected`] if there is no active session
    /// - the transport error if the sign-out call itself failed (the client stays connected)
    /// - the failure of a background task that did not stop cleanly
    pub async fn disconnect(&self) -> Result<bool> {
        if !self
            .connection
            .transition(ConnectionState::Connected, ConnectionState::Disconnecting)
            .await
        {
            return Err(SignalingError::NotConnected);
        }

        let Some(session) = self.state.read().await.session.clone() else {
            self.connection.set_state(ConnectionState::Disconnected).await;
            return Err(SignalingError::NotConnected);
        };

        tracing::info!("Signing out peer {}", session.id);
        let response = match self
            .connection
            .sign_out(&session, &self.lifetime.child_token())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Sign-out failed: {}", e);
                self.connection.set_state(ConnectionState::Connected).await;
                return Err(e);
            }
        };

        if !response.is_ok() {
            tracing::warn!("Sign-out rejected with status {}", response.status);
            self.connection.set_state(ConnectionState::Connected).await;
            return Ok(false);
        }

        let tasks = self.state.write().await.task_manager.take();
        let stopped = tasks.shutdown().await;

        self.state.write().await.session = None;
        self.peers.write().await.clear();
        self.connection.set_state(ConnectionState::Disconnected).await;
        tracing::info!("Signed out peer {}", session.id);
        self.events.emit(SignalingEvent::Disconnected);

        stopped.map(|()| true)
    }

    /// Relays `message` to `peer_id` through the server.
    ///
    /// Returns `Ok(false)` if the server answers with a non-200 status.
    pub async fn send_to_peer(&self, peer_id: PeerId, message: &str) -> Result<bool> {
        let session = self.active_session().await?;
        let response = self
            .connection
            .send_message(&session, peer_id, message, &self.lifetime.child_token())
            .await?;

        if response.is_ok() {
            tracing::debug!("Sent {} bytes to peer {}", message.len(), peer_id);
            Ok(true)
        } else {
            tracing::warn!(
                "Message to peer {} rejected with status {}",
                peer_id,
                response.status
            );
            Ok(false)
        }
    }

    /// Tells `peer_id` the call is over.
    pub async fn hang_up(&self, peer_id: PeerId) -> Result<bool> {
        self.send_to_peer(peer_id, HANGUP_MESSAGE).await
    }

    async fn active_session(&self) -> Result<Session> {
        if !self.connection.is_connected().await {
            return Err(SignalingError::NotConnected);
        }
        self.state
            .read()
            .await
            .session
            .clone()
            .ok_or(SignalingError::NotConnected)
    }

    /// Tears the client down without signing out.
    ///
    /// Aborts an in-flight sign-in, stops the background tasks and waits for
    /// them. No event is raised. Every later `connect` fails with
    /// [`SignalingError::Cancelled`].
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down signaling client");
        self.lifetime.cancel();

        let tasks = {
            let mut state = self.state.write().await;
            state.session = None;
            state.task_manager.take()
        };
        let stopped = tasks.shutdown().await;

        self.peers.write().await.clear();
        self.connection.set_state(ConnectionState::Disconnected).await;
        stopped
    }

    /// Peers currently listed by the server, sorted by id.
    pub async fn peers(&self) -> Vec<Peer> {
        self.peers.read().await.peers()
    }

    /// Id assigned at sign-in, or [`DISCONNECTED_ID`] without a session.
    pub async fn current_id(&self) -> PeerId {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map_or(DISCONNECTED_ID, |session| session.id)
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Base URI of the active session.
    pub async fn connected_uri(&self) -> Option<Url> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|session| session.endpoint.clone())
    }

    pub async fn auth_token(&self) -> Option<String> {
        self.options.read().await.auth_token.clone()
    }

    /// Replaces the token sent with every following request.
    pub async fn set_auth_token(&self, token: Option<String>) -> Result<()> {
        if let Some(token) = &token {
            HeaderValue::from_str(token)?;
        }
        self.options.write().await.auth_token = token;
        Ok(())
    }

    /// Heartbeat period in milliseconds; `None` when disabled.
    pub async fn heartbeat_interval(&self) -> Option<u64> {
        self.options.read().await.heartbeat_interval
    }

    /// Takes effect on the next connect.
    pub async fn set_heartbeat_interval(&self, interval: Option<u64>) {
        self.options.write().await.heartbeat_interval = interval;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{HttpRequest, HttpResponse};
    use crate::types::HEARTBEAT_DISABLED;
    use async_trait::async_trait;
    use reqwest::header::{AUTHORIZATION, PRAGMA};
    use reqwest::{Method, StatusCode};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::timeout;

    enum Scripted {
        Respond(HttpResponse),
        Fail,
    }

    /// Answers from per-path queues. Unscripted `/wait` calls hang until
    /// cancelled; any other unscripted call gets an empty 200.
    #[derive(Default)]
    struct ScriptedHttp {
        requests: Mutex<Vec<(Method, HttpRequest)>>,
        script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    }

    impl ScriptedHttp {
        fn push(&self, path: &str, step: Scripted) {
            self.script
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push_back(step);
        }

        fn respond(&self, path: &str, response: HttpResponse) {
            self.push(path, Scripted::Respond(response));
        }

        fn uris(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(_, request)| request.uri.to_string())
                .collect()
        }

        fn count(&self, path: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, request)| request.uri.path() == path)
                .count()
        }
    }

    #[async_trait]
    impl SimpleHttpClient for ScriptedHttp {
        async fn execute(
            &self,
            method: Method,
            request: &HttpRequest,
            cancel: &CancellationToken,
        ) -> std::result::Result<HttpResponse, HttpError> {
            self.requests
                .lock()
                .unwrap()
                .push((method, request.clone()));

            let path = request.uri.path().to_string();
            let step = self
                .script
                .lock()
                .unwrap()
                .get_mut(&path)
                .and_then(VecDeque::pop_front);

            match step {
                Some(Scripted::Respond(response)) => Ok(response),
                Some(Scripted::Fail) => Err(HttpError::transport("connection refused")),
                None if path == "/wait" => {
                    cancel.cancelled().await;
                    Err(HttpError::Cancelled)
                }
                None => Ok(HttpResponse::new(StatusCode::OK)),
            }
        }
    }

    fn tagged(id: PeerId, body: &str) -> HttpResponse {
        HttpResponse::new(StatusCode::OK)
            .with_header(PRAGMA, HeaderValue::from_str(&id.to_string()).unwrap())
            .with_body(body)
    }

    fn base() -> Url {
        Url::parse("http://unit.test").unwrap()
    }

    fn client(options: SignalingClientOptions) -> (SignalingClient, Arc<ScriptedHttp>) {
        let http = Arc::new(ScriptedHttp::default());
        let client = SignalingClient::with_http_client(http.clone(), options).unwrap();
        (client, http)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SignalingEvent>) -> Vec<SignalingEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SignalingEvent>) -> SignalingEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_connect_success() {
        let (client, http) = client(SignalingClientOptions {
            auth_token: Some("secret".to_string()),
            ..Default::default()
        });
        http.respond("/sign_in", tagged(5, "alice,1,1\nme,5,1\nbob,2,0\n"));
        let mut rx = client.subscribe();

        assert!(client.connect(&base(), "me").await.unwrap());

        assert_eq!(client.current_id().await, 5);
        assert!(client.is_connected().await);
        assert_eq!(client.connected_uri().await, Some(base()));
        assert_eq!(client.peers().await, vec![Peer::new(1, "alice")]);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            SignalingEvent::PeerConnected { id: 1, name } if name == "alice"
        ));
        assert!(matches!(events[1], SignalingEvent::Connected));

        let requests = http.requests.lock().unwrap().clone();
        assert_eq!(requests[0].0, Method::GET);
        assert_eq!(requests[0].1.uri.as_str(), "http://unit.test/sign_in?peer_name=me");
        assert_eq!(requests[0].1.headers[AUTHORIZATION], "secret");

        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_bad_status_raises_failure() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", HttpResponse::new(StatusCode::BAD_REQUEST));
        let mut rx = client.subscribe();

        assert!(!client.connect(&base(), "me").await.unwrap());
        assert!(!client.is_connected().await);
        assert_eq!(client.current_id().await, DISCONNECTED_ID);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            SignalingEvent::ConnectionFailure(error) => {
                let message = error.to_string();
                assert!(message.contains("Invalid StatusCode"));
                assert!(message.contains("400"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(client.state.read().await.task_manager.is_empty());
    }

    #[tokio::test]
    async fn test_connect_transport_failure_is_absorbed() {
        let (client, http) = client(SignalingClientOptions::default());
        http.push("/sign_in", Scripted::Fail);
        let mut rx = client.subscribe();

        assert!(!client.connect(&base(), "me").await.unwrap());

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SignalingEvent::ConnectionFailure(error)
                if matches!(**error, SignalingError::Http(HttpError::Transport(_)))
        ));

        // Failure leaves the client usable
        http.respond("/sign_in", tagged(3, ""));
        assert!(client.connect(&base(), "me").await.unwrap());
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_without_peer_id_propagates() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", HttpResponse::new(StatusCode::OK));
        let mut rx = client.subscribe();

        let result = client.connect(&base(), "me").await;
        assert!(matches!(result, Err(SignalingError::InvalidPeerId(_))));
        assert!(!client.is_connected().await);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_connect_twice_is_rejected() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(matches!(
            client.connect(&base(), "me").await,
            Err(SignalingError::AlreadyConnected)
        ));
        assert_eq!(http.count("/sign_in"), 1);
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_rejected() {
        let (client, http) = client(SignalingClientOptions::default());
        assert!(matches!(
            client.disconnect().await,
            Err(SignalingError::NotConnected)
        ));
        assert!(http.uris().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_success() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, "alice,1,1\n"));
        let mut rx = client.subscribe();

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(client.disconnect().await.unwrap());

        assert!(!client.is_connected().await);
        assert_eq!(client.current_id().await, DISCONNECTED_ID);
        assert_eq!(client.connected_uri().await, None);
        assert!(client.peers().await.is_empty());
        assert!(client.state.read().await.task_manager.is_empty());
        assert!(
            http.uris()
                .contains(&"http://unit.test/sign_out?peer_id=5".to_string())
        );

        let events = drain(&mut rx);
        let connected = events
            .iter()
            .filter(|e| matches!(e, SignalingEvent::Connected))
            .count();
        let disconnected = events
            .iter()
            .filter(|e| matches!(e, SignalingEvent::Disconnected))
            .count();
        assert_eq!((connected, disconnected), (1, 1));
        assert!(matches!(events.last(), Some(SignalingEvent::Disconnected)));

        // Nothing from the old session after Disconnected
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_disconnect_bad_status_stays_connected() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));
        http.respond("/sign_out", HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR));

        assert!(client.connect(&base(), "me").await.unwrap());
        let mut rx = client.subscribe();

        assert!(!client.disconnect().await.unwrap());
        assert!(client.is_connected().await);
        assert_eq!(client.current_id().await, 5);
        assert!(client.state.read().await.task_manager.contains("wait"));
        assert!(drain(&mut rx).is_empty());

        // A second attempt succeeds
        assert!(client.disconnect().await.unwrap());
    }

    #[tokio::test]
    async fn test_disconnect_transport_failure_propagates() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));
        http.push("/sign_out", Scripted::Fail);

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(matches!(
            client.disconnect().await,
            Err(SignalingError::Http(HttpError::Transport(_)))
        ));
        assert!(client.is_connected().await);
        client.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_disabled_starts_only_wait() {
        let (client, http) = client(SignalingClientOptions {
            heartbeat_interval: HEARTBEAT_DISABLED,
            ..Default::default()
        });
        http.respond("/sign_in", tagged(5, ""));

        assert!(client.connect(&base(), "me").await.unwrap());
        {
            let state = client.state.read().await;
            assert!(state.task_manager.contains("wait"));
            assert!(!state.task_manager.contains("heartbeat"));
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(http.count("/heartbeat"), 0);
        client.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_polls_while_connected() {
        let (client, http) = client(SignalingClientOptions {
            heartbeat_interval: Some(10),
            ..Default::default()
        });
        http.respond("/sign_in", tagged(5, ""));

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(client.state.read().await.task_manager.contains("heartbeat"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(http.count("/heartbeat") >= 2);
        assert!(
            http.uris()
                .contains(&"http://unit.test/heartbeat?peer_id=5".to_string())
        );

        client.disconnect().await.unwrap();
        let after_disconnect = http.count("/heartbeat");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(http.count("/heartbeat"), after_disconnect);
    }

    #[tokio::test]
    async fn test_wait_loop_routes_responses() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));
        http.respond("/wait", tagged(5, "bob,2,1\n"));
        http.respond("/wait", tagged(2, "offer"));
        http.respond("/wait", tagged(2, "BYE"));
        let mut rx = client.subscribe();

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(matches!(next_event(&mut rx).await, SignalingEvent::Connected));

        assert!(matches!(
            next_event(&mut rx).await,
            SignalingEvent::PeerConnected { id: 2, name } if name == "bob"
        ));
        // Peer messages are snapshot-parsed too, so the empty list drops bob
        assert!(matches!(
            next_event(&mut rx).await,
            SignalingEvent::MessageFromPeer { id: 2, body } if body == "offer"
        ));
        assert!(matches!(
            next_event(&mut rx).await,
            SignalingEvent::PeerDisconnected(2)
        ));
        assert!(matches!(next_event(&mut rx).await, SignalingEvent::PeerHangup(2)));

        assert!(
            http.uris()
                .iter()
                .filter(|uri| *uri == "http://unit.test/wait?peer_id=5")
                .count()
                >= 3
        );
        assert!(client.disconnect().await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_bad_status_ends_loop() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));
        http.respond("/wait", HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE));

        assert!(client.connect(&base(), "me").await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(http.count("/wait"), 1);
        assert!(client.is_connected().await);
        assert!(client.disconnect().await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_transport_failure_raises_event() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));
        http.push("/wait", Scripted::Fail);
        let mut rx = client.subscribe();

        assert!(client.connect(&base(), "me").await.unwrap());
        assert!(matches!(next_event(&mut rx).await, SignalingEvent::Connected));
        assert!(matches!(
            next_event(&mut rx).await,
            SignalingEvent::ConnectionFailure(_)
        ));

        // The failed loop does not make disconnect fail
        assert!(client.disconnect().await.unwrap());
    }

    #[tokio::test]
    async fn test_send_to_peer() {
        let (client, http) = client(SignalingClientOptions::default());
        assert!(matches!(
            client.send_to_peer(2, "hi").await,
            Err(SignalingError::NotConnected)
        ));

        http.respond("/sign_in", tagged(5, ""));
        http.respond("/message", HttpResponse::new(StatusCode::OK));
        http.respond("/message", HttpResponse::new(StatusCode::NOT_FOUND));
        assert!(client.connect(&base(), "me").await.unwrap());

        assert!(client.send_to_peer(2, "hi").await.unwrap());
        assert!(!client.hang_up(2).await.unwrap());

        let messages: Vec<(Method, HttpRequest)> = http
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, request)| request.uri.path() == "/message")
            .cloned()
            .collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, Method::POST);
        assert_eq!(
            messages[0].1.uri.as_str(),
            "http://unit.test/message?peer_id=5&to=2"
        );
        assert_eq!(messages[0].1.body.as_deref(), Some("hi"));
        assert_eq!(messages[1].1.body.as_deref(), Some("BYE"));

        client.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_everything() {
        let (client, http) = client(SignalingClientOptions {
            heartbeat_interval: Some(10),
            ..Default::default()
        });
        http.respond("/sign_in", tagged(5, ""));
        assert!(client.connect(&base(), "me").await.unwrap());
        let mut rx = client.subscribe();

        client.shutdown().await.unwrap();

        assert!(!client.is_connected().await);
        assert_eq!(client.current_id().await, DISCONNECTED_ID);
        assert!(client.state.read().await.task_manager.is_empty());
        assert_eq!(http.count("/sign_out"), 0);
        assert!(drain(&mut rx).is_empty());
        assert!(matches!(
            client.connect(&base(), "me").await,
            Err(SignalingError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn test_auth_token_applies_to_next_request() {
        let (client, http) = client(SignalingClientOptions::default());
        http.respond("/sign_in", tagged(5, ""));

        client
            .set_auth_token(Some("Bearer fresh".to_string()))
            .await
            .unwrap();
        assert_eq!(client.auth_token().await.as_deref(), Some("Bearer fresh"));
        assert!(
            client
                .set_auth_token(Some("bad\r\nvalue".to_string()))
                .await
                .is_err()
        );

        assert!(client.connect(&base(), "me").await.unwrap());
        let requests = http.requests.lock().unwrap().clone();
        assert_eq!(requests[0].1.headers[AUTHORIZATION], "Bearer fresh");

        client.set_heartbeat_interval(Some(250)).await;
        assert_eq!(client.heartbeat_interval().await, Some(250));
        client.shutdown().await.unwrap();
    }
}
