use super::SignalingClientOptions;
use crate::types::{DEFAULT_PORT, Result, SignalingError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

const DEFAULT_PEER_NAME: &str = "signaling-peer";

fn default_heartbeat() -> i64 {
    -1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    /// Sent verbatim as the Authorization header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Signaling settings as stored in a JSON config file.
///
/// ```json
/// {
///   "server": "signaling.example.com",
///   "port": 8888,
///   "heartbeat": 5000,
///   "peerName": "renderer-1",
///   "authentication": { "token": "Bearer abc" }
/// }
/// ```
///
/// A negative `heartbeat` disables the heartbeat task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingConfig {
    /// Host name or full `http(s)://` URI of the signaling server
    pub server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default = "default_heartbeat")]
    pub heartbeat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthenticationConfig>,
}

impl SignalingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading signaling config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Base URI to sign in against. Bare host names get `http://` and the
    /// default port.
    pub fn base_uri(&self) -> Result<Url> {
        let has_scheme = self.server.contains("://");
        let mut uri = if has_scheme {
            Url::parse(&self.server)?
        } else {
            Url::parse(&format!("http://{}", self.server))?
        };

        let port = match self.port {
            Some(port) => Some(port),
            None if !has_scheme => Some(DEFAULT_PORT),
            None => None,
        };
        if let Some(port) = port {
            uri.set_port(Some(port))
                .map_err(|()| SignalingError::UrlParse(url::ParseError::InvalidPort))?;
        }

        Ok(uri)
    }

    pub fn peer_name(&self) -> &str {
        self.peer_name.as_deref().unwrap_or(DEFAULT_PEER_NAME)
    }

    pub fn to_options(&self) -> SignalingClientOptions {
        SignalingClientOptions {
            auth_token: self
                .authentication
                .as_ref()
                .and_then(|auth| auth.token.clone()),
            heartbeat_interval: u64::try_from(self.heartbeat).ok().filter(|ms| *ms > 0),
        }
    }
}
