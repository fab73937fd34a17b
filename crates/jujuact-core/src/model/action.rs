// ── Action domain types ──

use chrono::{DateTime, TimeDelta, Utc};
use jujuact_api::models::ActionResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::tag::ActionTag;
use crate::error::CoreError;

/// Action lifecycle as seen by a poller.
///
/// `pending → completed` or `pending → failed`. The controller's
/// `running` folds into `Pending` and `cancelled` into `Failed`; the raw
/// string is kept on [`ActionRecord::raw_status`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ActionStatus {
    Pending,
    Completed,
    Failed,
}

impl ActionStatus {
    /// Fold a controller status string into the three-state lifecycle.
    pub fn from_controller(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "running" => Self::Pending,
            "completed" => Self::Completed,
            "failed" | "cancelled" => Self::Failed,
            other => {
                tracing::debug!(status = other, "unknown action status, treating as pending");
                Self::Pending
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ── ActionRecord ────────────────────────────────────────────────────

/// One action request: its tag, folded status, and the controller's
/// result exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    pub tag: ActionTag,
    pub status: ActionStatus,
    pub data: ActionResult,
}

impl ActionRecord {
    /// Build a record from a controller result.
    ///
    /// The result must carry `action.tag`; nothing else is required.
    pub fn from_result(data: ActionResult) -> Result<Self, CoreError> {
        let tag = data
            .action
            .as_ref()
            .map(|a| a.tag.as_str())
            .filter(|t| !t.is_empty())
            .map(ActionTag::from_controller)
            .ok_or_else(|| CoreError::Internal("action result carries no action tag".into()))?;

        Ok(Self {
            tag,
            status: ActionStatus::from_controller(&data.status),
            data,
        })
    }

    /// Status string as the controller reported it.
    pub fn raw_status(&self) -> &str {
        &self.data.status
    }

    pub fn name(&self) -> &str {
        self.data.action.as_ref().map_or("", |a| a.name.as_str())
    }

    pub fn receiver(&self) -> &str {
        self.data.action.as_ref().map_or("", |a| a.receiver.as_str())
    }

    pub fn message(&self) -> &str {
        &self.data.message
    }

    pub fn output(&self) -> &Map<String, Value> {
        &self.data.output
    }

    pub fn enqueued(&self) -> Option<DateTime<Utc>> {
        self.data.enqueued
    }

    /// Run time, once the action has both started and completed.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        Some(self.data.completed? - self.data.started?)
    }
}

// ── ReceiverActions ─────────────────────────────────────────────────

/// Every action recorded against one receiver (`Action.ListAll`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverActions {
    pub receiver: String,
    pub actions: Vec<ActionRecord>,
    /// Per-receiver error reported by the controller.
    pub error: Option<String>,
}
