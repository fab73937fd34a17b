use thiserror::Error;

/// Top-level error type for the `jujuact-api` crate.
///
/// Covers every failure mode of the RPC surface: login, TLS setup,
/// the WebSocket connection, controller-side RPC errors, and payload
/// decoding. `jujuact-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong secret, unknown user, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// TLS configuration or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Reading a local file (CA certificate) failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-call.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed while a response was outstanding.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── RPC ─────────────────────────────────────────────────────────
    /// Error reported by the controller in the response envelope.
    #[error("RPC error: {message}")]
    Rpc {
        message: String,
        code: Option<String>,
    },

    /// The response envelope had neither `Response` nor `Error`.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Request encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if the controller rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Rpc { code, .. } => code.as_deref() == Some("unauthorized access"),
            _ => false,
        }
    }

    /// Returns `true` if the session is unusable after this error.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::WebSocketConnect(_) | Self::WebSocketClosed { .. }
        )
    }

    /// Extract the controller error code, if available.
    pub fn rpc_error_code(&self) -> Option<&str> {
        match self {
            Self::Rpc { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
