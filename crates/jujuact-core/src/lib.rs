//! Action lifecycle layer between `jujuact-api` and the CLI.
//!
//! - **[`ActionClient`]**: owns one controller session and exposes the
//!   action operations: spec discovery, enqueue, status polling,
//!   cancellation, listing, plus status, topology and annotations.
//!
//! - **[`topology::resolve`]**: rebuilds service → units from a status
//!   snapshot, pulling subordinate units from their principals.
//!
//! - **[`spec::parse_action_specs`]**: turns charm action schemas into
//!   typed [`ActionSpec`]s with inferred parameter types.
//!
//! - **Domain model** ([`model`]): [`ActionRecord`], [`ActionStatus`],
//!   [`ActionTag`] and the tag helpers.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod spec;
pub mod topology;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::ActionClient;
pub use config::{ClientConfig, TlsVerification};
pub use error::CoreError;
pub use model::{
    ActionProperty, ActionRecord, ActionSpec, ActionStatus, ActionTag, PropertyType,
    ReceiverActions, ServiceSpecs, ServiceUnits,
};

// Wire types callers see in return values.
pub use jujuact_api::models::{ActionResult, StatusSnapshot, UnitStatus};
