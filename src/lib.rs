//! # Peer Signaling
//!
//! An async client for long-poll HTTP signaling servers (the
//! `peerconnection_server` protocol: `/sign_in`, `/wait`, `/heartbeat`,
//! `/message`, `/sign_out`).
//!
//! ## Example
//!
//! ```no_run
//! use peer_signaling::{SignalingClient, SignalingClientOptions, SignalingEvent};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SignalingClient::new(SignalingClientOptions::default())?;
//!     let mut events = client.subscribe();
//!
//!     client
//!         .connect(&Url::parse("http://localhost:8888")?, "renderer")
//!         .await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{}", event);
//!         if let SignalingEvent::MessageFromPeer { id, body } = event {
//!             client.send_to_peer(id, &body).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod peers;
pub mod types;

pub use client::{SignalingClient, SignalingClientBuilder, SignalingClientOptions, SignalingConfig};
pub use infrastructure::{
    HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, SerializedHttpClient,
    SimpleHttpClient,
};
pub use messaging::SignalingEvent;
pub use types::{DISCONNECTED_ID, HEARTBEAT_DISABLED, Peer, PeerId, Result, SignalingError};
