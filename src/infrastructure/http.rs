//! Minimal HTTP capability the signaling client depends on.
//!
//! [`SimpleHttpClient`] exposes one method per verb over an immutable
//! [`HttpRequest`]. A call either produces an [`HttpResponse`] (whatever its
//! status) or fails with an [`HttpError`]; a non-200 status is never an error at
//! this layer.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to complete an HTTP round-trip.
#[derive(Error, Debug)]
pub enum HttpError {
    /// Request construction, transmission or response reading failed
    #[error("HTTP request failed: {0}")]
    Transport(#[source] BoxError),

    /// The call was aborted through its cancellation token
    #[error("HTTP request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Wraps any error as a transport failure, keeping it as the source.
    pub fn transport(cause: impl Into<BoxError>) -> Self {
        Self::Transport(cause.into())
    }
}

/// Outgoing request: absolute URI, headers, optional body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub uri: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Body text, empty when the response had none.
    pub fn body_str(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Request/response capability set used by the signaling client.
///
/// Implementors provide [`execute`](Self::execute); the per-verb methods delegate
/// to it. Implementations must abort the in-flight call and return
/// [`HttpError::Cancelled`] once `cancel` fires.
#[async_trait]
pub trait SimpleHttpClient: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError>;

    async fn get(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::GET, request, cancel).await
    }

    async fn post(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::POST, request, cancel).await
    }

    async fn put(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::PUT, request, cancel).await
    }

    async fn delete(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::DELETE, request, cancel).await
    }

    async fn options(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::OPTIONS, request, cancel).await
    }

    async fn trace(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::TRACE, request, cancel).await
    }

    async fn connect(
        &self,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(Method::CONNECT, request, cancel).await
    }
}

/// [`SimpleHttpClient`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest::Client` (proxies, TLS roots, ...).
    ///
    /// Avoid a global request timeout: `/wait` is a long-poll.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn round_trip(
        &self,
        method: Method,
        request: &HttpRequest,
    ) -> Result<HttpResponse, HttpError> {
        let mut builder = self
            .client
            .request(method, request.uri.clone())
            .headers(request.headers.clone());

        if let Some(body) = request.body.as_ref().filter(|body| !body.is_empty()) {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(HttpError::transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(HttpError::transport)?;

        Ok(HttpResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}

#[async_trait]
impl SimpleHttpClient for ReqwestHttpClient {
    async fn execute(
        &self,
        method: Method,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        tracing::debug!("{} {}", method, request.uri);

        // Dropping the reqwest future aborts the in-flight request
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HttpError::Cancelled),
            result = self.round_trip(method, request) => result,
        }
    }
}

/// Wraps a transport that must not run concurrent calls on the same endpoint.
///
/// Calls are serialized per URI path, so a pending `/wait` never blocks
/// `/sign_out` or `/heartbeat`.
pub struct SerializedHttpClient<C> {
    inner: C,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<C: SimpleHttpClient> SerializedHttpClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, path: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(path.to_string()).or_default())
    }
}

#[async_trait]
impl<C: SimpleHttpClient> SimpleHttpClient for SerializedHttpClient<C> {
    async fn execute(
        &self,
        method: Method,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, HttpError> {
        let lock = self.lock_for(request.uri.path());

        let _guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(HttpError::Cancelled),
            guard = lock.lock() => guard,
        };

        self.inner.execute(method, request, cancel).await
    }
}
