// RPC envelope and session abstraction
//
// Every controller call is a JSON frame `{RequestId, Type, Version,
// Request, Params}` answered by `{RequestId, Response}` or
// `{RequestId, Error, ErrorCode}`. `RpcSession` is the seam between
// the action client and whatever carries those frames.

pub mod models;

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::rpc::models::{Entities, Entity, StatusSnapshot};

/// Facade names used by this crate.
pub mod facade {
    pub const ACTION: &str = "Action";
    pub const ADMIN: &str = "Admin";
    pub const CLIENT: &str = "Client";
}

// ── Request ──────────────────────────────────────────────────────────

/// One RPC request, minus the `RequestId` the session assigns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RpcRequest {
    /// Facade name, serialized as `Type`.
    #[serde(rename = "Type")]
    pub facade: String,

    /// Facade version; omitted for controllers that predate versioning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Method name on the facade.
    pub request: String,

    pub params: Value,
}

impl RpcRequest {
    /// Build a request, encoding `params` to JSON.
    pub fn new(
        facade: &str,
        request: &str,
        params: &impl Serialize,
    ) -> Result<Self, Error> {
        Ok(Self {
            facade: facade.to_owned(),
            version: None,
            request: request.to_owned(),
            params: serde_json::to_value(params)?,
        })
    }

    /// A request on the `Action` facade.
    pub fn action(request: &str, params: &impl Serialize) -> Result<Self, Error> {
        Self::new(facade::ACTION, request, params)
    }

    /// An `Action` request addressed to a list of entity tags.
    pub fn action_entities<I, S>(request: &str, tags: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = Entities {
            entities: tags.into_iter().map(|tag| Entity { tag: tag.into() }).collect(),
        };
        Self::action(request, &params)
    }

    /// `Client.FullStatus` with no filter patterns.
    pub fn full_status() -> Self {
        Self {
            facade: facade::CLIENT.to_owned(),
            version: None,
            request: "FullStatus".to_owned(),
            params: serde_json::json!({ "Patterns": [] }),
        }
    }

    /// Pin a facade version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }
}

// ── Frames ───────────────────────────────────────────────────────────

/// Outgoing frame: the request plus its correlation id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RequestFrame<'a> {
    pub request_id: u64,
    #[serde(flatten)]
    pub request: &'a RpcRequest,
}

/// Incoming frame.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ResponseFrame {
    #[serde(default)]
    pub request_id: Option<u64>,
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
}

impl ResponseFrame {
    /// Unwrap the envelope into the `Response` payload.
    pub(crate) fn into_result(self) -> Result<Value, Error> {
        match (self.error, self.response) {
            (Some(message), _) if !message.is_empty() => Err(Error::Rpc {
                message,
                code: self.error_code.filter(|c| !c.is_empty()),
            }),
            (_, Some(response)) => Ok(response),
            _ => Err(Error::UnexpectedResponse(format!(
                "frame {:?} carried neither Response nor Error",
                self.request_id
            ))),
        }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode a `Response` payload into a typed struct.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(&value).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

// ── Session ──────────────────────────────────────────────────────────

/// An authenticated controller session.
///
/// Implementations carry one call at a time; the action client never
/// issues concurrent calls on the same session.
pub trait RpcSession: Send + Sync {
    /// Send one request and return its `Response` payload.
    fn call(&self, request: RpcRequest) -> impl Future<Output = Result<Value, Error>> + Send;

    /// Fetch the full controller status.
    fn status(&self) -> impl Future<Output = Result<StatusSnapshot, Error>> + Send {
        async move {
            let value = self.call(RpcRequest::full_status()).await?;
            decode(value)
        }
    }

    /// Release the session. The default does nothing.
    fn close(&self) -> impl Future<Output = Result<(), Error>> + Send {
        async { Ok(()) }
    }
}
