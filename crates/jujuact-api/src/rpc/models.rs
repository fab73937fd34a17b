// Wire payloads
//
// Request params and response bodies for the Admin, Client and Action
// facades. Field names are controller-defined and must match exactly:
// the status and facade params are PascalCase, action results are
// lowercase. Maps the controller sends as `null` decode as empty.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode `null` (or a missing field) as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Shared params ────────────────────────────────────────────────────

/// `{Tag: "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "Tag")]
    pub tag: String,
}

/// `{Entities: [{Tag}, ...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(rename = "Entities")]
    pub entities: Vec<Entity>,
}

/// Per-entity error body inside a result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: String,
}

// ── Status ───────────────────────────────────────────────────────────

/// `Client.FullStatus` response.
///
/// Only the service tree is typed; every other top-level field is kept
/// in `other` so callers can scan it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusSnapshot {
    #[serde(default)]
    pub environment_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub services: BTreeMap<String, ServiceStatus>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// One deployed service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceStatus {
    #[serde(default)]
    pub charm: String,

    #[serde(default)]
    pub exposed: bool,

    #[serde(default)]
    pub life: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub units: BTreeMap<String, UnitStatus>,

    /// Principal services this (subordinate) service attaches to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subordinate_to: Vec<String>,
}

/// One unit of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnitStatus {
    #[serde(default)]
    pub agent_state: String,

    #[serde(default)]
    pub agent_state_info: String,

    #[serde(default)]
    pub machine: String,

    #[serde(default)]
    pub public_address: String,

    #[serde(default)]
    pub charm: String,

    #[serde(default)]
    pub life: String,

    /// Subordinate units deployed alongside this one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub subordinates: BTreeMap<String, UnitStatus>,
}

// ── Enqueue ──────────────────────────────────────────────────────────

/// `Action.Enqueue` params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnqueueParams {
    #[serde(rename = "Actions")]
    pub actions: Vec<ActionRequest>,
}

/// One action to run on one receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionRequest {
    pub receiver: String,
    pub name: String,
    pub parameters: Map<String, Value>,
}

// ── Action results ───────────────────────────────────────────────────

/// `{results: [...]}` returned by Enqueue and Cancel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ActionResult>,
}

/// The controller's view of one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub action: Option<ActionDescriptor>,

    /// `pending`, `running`, `completed`, `failed` or `cancelled`.
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub output: Map<String, Value>,

    #[serde(default)]
    pub enqueued: Option<DateTime<Utc>>,

    #[serde(default)]
    pub started: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,

    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// The action request as the controller recorded it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub tag: String,

    #[serde(default)]
    pub receiver: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Map<String, Value>,
}

// ── ListAll ──────────────────────────────────────────────────────────

/// `Action.ListAll` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsByReceivers {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<ActionsByReceiver>,
}

/// Every action recorded for one receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionsByReceiver {
    #[serde(default)]
    pub receiver: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<ActionResult>,

    #[serde(default)]
    pub error: Option<ErrorBody>,
}

// ── ServicesCharmActions ─────────────────────────────────────────────

/// `Action.ServicesCharmActions` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServicesCharmActionsResults {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<ServiceCharmActions>,
}

/// Action schema declared by one service's charm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCharmActions {
    /// `service-<name>`.
    #[serde(default)]
    pub servicetag: String,

    #[serde(default)]
    pub actions: Option<CharmActions>,

    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharmActions {
    #[serde(rename = "ActionSpecs", default)]
    pub action_specs: Option<BTreeMap<String, ActionSpecDef>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionSpecDef {
    #[serde(default)]
    pub description: String,

    /// JSON-schema object describing the action's parameters.
    #[serde(default)]
    pub params: ActionParamsSchema,
}

/// The subset of the params schema the client reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionParamsSchema {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: BTreeMap<String, PropertySchema>,
}

/// Schema of one action parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub default: Option<Value>,
}

// ── Annotations ──────────────────────────────────────────────────────

/// `Client.GetAnnotations` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnotationsResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: BTreeMap<String, String>,
}
