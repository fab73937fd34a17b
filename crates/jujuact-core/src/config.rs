// ── Runtime connection configuration ──
//
// Describes how to reach and log in to a controller. Carries credentials
// but never touches disk: the CLI (via jujuact-config) builds a
// `ClientConfig` and hands it in.

use std::path::PathBuf;

use jujuact_api::{TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::model::user_tag;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Bundled web PKI roots (strict).
    SystemDefaults,
    /// Custom CA certificate file, e.g. the controller's own CA.
    CustomCa(PathBuf),
    /// Skip verification. Controllers ship self-signed certificates.
    #[default]
    DangerAcceptInvalid,
}

impl TlsVerification {
    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match self {
            Self::SystemDefaults => TlsMode::System,
            Self::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            Self::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig { tls }
    }
}

/// Everything needed to open one controller session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit WebSocket endpoint (`wss://host:17070/`).
    pub endpoint: Option<Url>,
    /// `host:port` candidates, used when no endpoint is set.
    pub addresses: Vec<String>,
    /// User name or `user-` tag; bare names are tagged at login.
    pub user: String,
    pub secret: SecretString,
    pub tls: TlsVerification,
}

impl ClientConfig {
    pub fn new(user: impl Into<String>, secret: SecretString) -> Self {
        Self {
            endpoint: None,
            addresses: Vec::new(),
            user: user.into(),
            secret,
            tls: TlsVerification::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    /// Login tag for `user`.
    pub fn auth_tag(&self) -> String {
        user_tag(&self.user)
    }

    /// Pick the endpoint to dial: the explicit endpoint, else the first
    /// address as a `wss://` URL.
    pub fn resolve_endpoint(&self) -> Result<Url, CoreError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let Some(address) = self.addresses.iter().map(|a| a.trim()).find(|a| !a.is_empty()) else {
            return Err(CoreError::ConnectionFailed {
                endpoint: "<none>".into(),
                reason: "no controller endpoint or API address configured".into(),
            });
        };

        Url::parse(&format!("wss://{address}")).map_err(|e| CoreError::ConnectionFailed {
            endpoint: address.to_owned(),
            reason: format!("malformed API address: {e}"),
        })
    }
}
