// ── Core error types ──
//
// User-facing errors from jujuact-core. Consumers never see WebSocket
// frames or JSON decode failures directly: the `From<jujuact_api::Error>`
// impl folds transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Controller errors ────────────────────────────────────────────
    /// Error reported by the controller, passed through unchanged.
    #[error("Controller error: {message}")]
    Rpc {
        message: String,
        code: Option<String>,
    },

    // ── Client-side errors ───────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Controller error code, when the controller supplied one.
    pub fn rpc_code(&self) -> Option<&str> {
        match self {
            Self::Rpc { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Fill in the endpoint on a connection failure raised below the
    /// layer that knows which endpoint was dialled.
    pub(crate) fn at_endpoint(self, endpoint: &str) -> Self {
        match self {
            Self::ConnectionFailed { reason, .. } => Self::ConnectionFailed {
                endpoint: endpoint.to_owned(),
                reason,
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<jujuact_api::Error> for CoreError {
    fn from(err: jujuact_api::Error) -> Self {
        match err {
            jujuact_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            jujuact_api::Error::Io(e) => CoreError::Config {
                message: format!("Cannot read CA certificate: {e}"),
            },
            jujuact_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                endpoint: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            jujuact_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                endpoint: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            jujuact_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                endpoint: String::new(),
                reason: format!("WebSocket closed (code {code}): {reason}"),
            },
            jujuact_api::Error::Rpc { message, code } => CoreError::Rpc { message, code },
            jujuact_api::Error::UnexpectedResponse(msg) => {
                CoreError::Internal(format!("Unexpected response: {msg}"))
            }
            jujuact_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            jujuact_api::Error::Serialization(e) => {
                CoreError::Internal(format!("Serialization error: {e}"))
            }
        }
    }
}
