//! WebSocket RPC session.
//!
//! Opens a WebSocket to the controller API endpoint, logs in through the
//! `Admin` facade, and then carries one request/response exchange at a
//! time. Every request gets a fresh `RequestId`; frames answering some
//! other id are logged and dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use jujuact_api::{RpcRequest, RpcSession, TransportConfig, WsSession};
//! use secrecy::SecretString;
//! use url::Url;
//!
//! let endpoint = Url::parse("wss://10.0.3.1:17070")?;
//! let secret = SecretString::from("its-a-secret".to_string());
//! let session = WsSession::open(&endpoint, "user-admin", &secret, &TransportConfig::default()).await?;
//!
//! let status = session.status().await?;
//! println!("{} services", status.services.len());
//!
//! session.close().await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::Error;
use crate::rpc::{RequestFrame, ResponseFrame, RpcRequest, RpcSession, facade};
use crate::transport::TransportConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── WsSession ────────────────────────────────────────────────────────

/// A live controller session over one WebSocket connection.
pub struct WsSession {
    endpoint: Url,
    stream: Mutex<WsStream>,
    next_request_id: AtomicU64,
}

impl WsSession {
    /// Open the WebSocket without logging in.
    ///
    /// `ws://` endpoints connect in plaintext; `wss://` endpoints use the
    /// TLS mode from `transport`.
    pub async fn connect(endpoint: &Url, transport: &TransportConfig) -> Result<Self, Error> {
        tracing::info!(endpoint = %endpoint, "Connecting to controller");

        let connector = match endpoint.scheme() {
            "wss" => Some(transport.build_connector()?),
            "ws" => None,
            other => {
                return Err(Error::WebSocketConnect(format!(
                    "unsupported endpoint scheme '{other}' (expected ws or wss)"
                )));
            }
        };

        let (stream, _response) = tokio_tungstenite::connect_async_tls_with_config(
            endpoint.as_str(),
            None,
            false,
            connector,
        )
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        tracing::info!("WebSocket connected");

        Ok(Self {
            endpoint: endpoint.clone(),
            stream: Mutex::new(stream),
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Connect and log in.
    pub async fn open(
        endpoint: &Url,
        user: &str,
        secret: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let session = Self::connect(endpoint, transport).await?;
        session.login(user, secret).await?;
        Ok(session)
    }

    /// Authenticate with `Admin.Login`.
    ///
    /// A rejected login comes back as an RPC error; it is reported as
    /// [`Error::Authentication`].
    pub async fn login(&self, user: &str, secret: &SecretString) -> Result<(), Error> {
        tracing::debug!(user, "logging in");

        let request = RpcRequest {
            facade: facade::ADMIN.to_owned(),
            version: None,
            request: "Login".to_owned(),
            params: json!({
                "AuthTag": user,
                "Password": secret.expose_secret(),
            }),
        };

        match self.call(request).await {
            Ok(_) => {
                tracing::info!(user, "login successful");
                Ok(())
            }
            Err(Error::Rpc { message, code }) => Err(Error::Authentication {
                message: match code {
                    Some(code) => format!("{message} ({code})"),
                    None => message,
                },
            }),
            Err(e) => Err(e),
        }
    }

    /// The endpoint this session is connected to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one frame and wait for the frame answering it.
    async fn exchange(&self, request: &RpcRequest) -> Result<Value, Error> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&RequestFrame {
            request_id,
            request,
        })?;

        tracing::debug!(
            request_id,
            facade = %request.facade,
            request = %request.request,
            "RPC call"
        );

        let mut stream = self.stream.lock().await;
        stream
            .send(Message::text(text))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        loop {
            let frame = stream.next().await;
            match frame {
                Some(Ok(Message::Text(text))) => {
                    let response: ResponseFrame =
                        serde_json::from_str(text.as_str()).map_err(|e| {
                            Error::Deserialization {
                                message: e.to_string(),
                                body: text.as_str().to_owned(),
                            }
                        })?;

                    if response.request_id != Some(request_id) {
                        tracing::debug!(
                            expected = request_id,
                            got = ?response.request_id,
                            "Dropping frame for another request"
                        );
                        continue;
                    }
                    return response.into_result();
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame.map_or_else(
                        || (1005, String::new()),
                        |cf| (u16::from(cf.code), cf.reason.as_str().to_owned()),
                    );
                    tracing::info!(code, reason = %reason, "WebSocket close frame received");
                    return Err(Error::WebSocketClosed { code, reason });
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // tungstenite answers pings on the next read/write
                    tracing::trace!("WebSocket ping");
                }
                Some(Ok(_)) => {
                    tracing::debug!("Ignoring non-text frame");
                }
                Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                None => {
                    return Err(Error::WebSocketClosed {
                        code: 1006,
                        reason: "stream ended".into(),
                    });
                }
            }
        }
    }
}

impl RpcSession for WsSession {
    async fn call(&self, request: RpcRequest) -> Result<Value, Error> {
        self.exchange(&request).await
    }

    async fn close(&self) -> Result<(), Error> {
        let mut stream = self.stream.lock().await;
        match stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                tracing::debug!("session closed");
                Ok(())
            }
            Err(e) => Err(Error::WebSocketConnect(e.to_string())),
        }
    }
}
