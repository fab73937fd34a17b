// ── Action client ──
//
// Action lifecycle over one controller session: discover specs, enqueue,
// poll, cancel, list. Every operation is a single request/response on
// the session; nothing is cached between calls.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use jujuact_api::models::{
    ActionRequest, ActionResult, ActionResults, ActionsByReceivers, AnnotationsResult,
    EnqueueParams, Entity, ErrorBody, ServicesCharmActionsResults, StatusSnapshot,
};
use jujuact_api::rpc::facade;
use jujuact_api::{RpcRequest, RpcSession, WsSession, decode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::{
    ActionRecord, ActionStatus, ActionTag, ReceiverActions, ServiceSpecs, ServiceUnits,
    service_tag, unit_tag,
};
use crate::spec::parse_action_specs;
use crate::topology;

/// How deep below each top-level status field to look for action records.
const STATUS_SCAN_DEPTH: usize = 2;

// ── ActionClient ─────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable; clones share the underlying session. Generic over
/// the session so tests (and alternative transports) can supply their
/// own [`RpcSession`].
pub struct ActionClient<S = WsSession> {
    session: Arc<S>,
}

impl<S> Clone for ActionClient<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S> fmt::Debug for ActionClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionClient").finish_non_exhaustive()
    }
}

impl ActionClient<WsSession> {
    /// Resolve the endpoint, open a WebSocket session and log in.
    pub async fn connect(config: &ClientConfig) -> Result<Self, CoreError> {
        let endpoint = config.resolve_endpoint()?;
        let session = WsSession::open(
            &endpoint,
            &config.auth_tag(),
            &config.secret,
            &config.tls.transport(),
        )
        .await
        .map_err(|e| CoreError::from(e).at_endpoint(endpoint.as_str()))?;

        Ok(Self::with_session(session))
    }

    /// One-shot: connect, run closure, close.
    pub async fn oneshot<F, Fut, T>(config: &ClientConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(ActionClient) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let client = Self::connect(config).await?;
        let result = f(client.clone()).await;
        if let Err(e) = client.close().await {
            debug!(error = %e, "close after one-shot failed");
        }
        result
    }
}

impl<S: RpcSession> ActionClient<S> {
    /// Wrap an already-authenticated session.
    pub fn with_session(session: S) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    // ── Status & topology ────────────────────────────────────────

    /// Full controller status, unshaped.
    pub async fn get_status(&self) -> Result<StatusSnapshot, CoreError> {
        Ok(self.session.status().await?)
    }

    /// Service → units, including subordinate units.
    pub async fn get_service_units(&self) -> Result<ServiceUnits, CoreError> {
        let snapshot = self.get_status().await?;
        Ok(topology::resolve(&snapshot))
    }

    // ── Spec discovery ───────────────────────────────────────────

    /// Actions declared by one service's charm, or by every deployed
    /// service when `service` is `None`.
    pub async fn get_action_specs(&self, service: Option<&str>) -> Result<ServiceSpecs, CoreError> {
        let services: Vec<String> = match service {
            Some(name) => vec![name.to_owned()],
            None => self.get_status().await?.services.into_keys().collect(),
        };

        if services.is_empty() {
            debug!("no services deployed, skipping ServicesCharmActions");
            return Ok(ServiceSpecs::new());
        }

        let request = RpcRequest::action_entities(
            "ServicesCharmActions",
            services.iter().map(|s| service_tag(s)),
        )?;
        let results: ServicesCharmActionsResults = decode(self.session.call(request).await?)?;

        Ok(parse_action_specs(&results))
    }

    // ── Enqueue ──────────────────────────────────────────────────

    /// Queue `action` on every receiver in one `Enqueue` call and return
    /// the first result.
    ///
    /// Receivers are passed through as given (`unit-<svc>-<n>` tags).
    /// Parameters are not checked against the action's spec.
    pub async fn enqueue_action<R: AsRef<str>>(
        &self,
        action: &str,
        receivers: &[R],
        params: Map<String, Value>,
    ) -> Result<ActionRecord, CoreError> {
        if receivers.is_empty() {
            return Err(CoreError::Validation {
                message: format!("action '{action}' needs at least one receiver"),
            });
        }

        let params = EnqueueParams {
            actions: receivers
                .iter()
                .map(|receiver| ActionRequest {
                    receiver: receiver.as_ref().to_owned(),
                    name: action.to_owned(),
                    parameters: params.clone(),
                })
                .collect(),
        };

        let request = RpcRequest::action("Enqueue", &params)?;
        let results: ActionResults = decode(self.session.call(request).await?)?;

        let first = results
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Internal("Enqueue returned no results".into()))?;

        if let Some(err) = controller_error(first.error.as_ref()) {
            return Err(err);
        }

        let record = ActionRecord::from_result(first)?;
        info!(
            tag = %record.tag,
            action,
            receivers = receivers.len(),
            "action enqueued"
        );
        Ok(record)
    }

    // ── Status polling ───────────────────────────────────────────

    /// Current status of one action, or `None` if no record carries
    /// exactly this tag.
    pub async fn get_action_status(&self, tag: &ActionTag) -> Result<Option<ActionStatus>, CoreError> {
        Ok(self.find_action(tag).await?.map(|record| record.status))
    }

    /// The full record behind [`get_action_status`](Self::get_action_status).
    pub async fn find_action(&self, tag: &ActionTag) -> Result<Option<ActionRecord>, CoreError> {
        let snapshot = self.get_status().await?;
        let found = scan_for_action(&snapshot, tag);
        if found.is_none() {
            debug!(tag = %tag, "no action record in status");
        }
        found.map(ActionRecord::from_result).transpose()
    }

    // ── Cancel ───────────────────────────────────────────────────

    /// Cancel a queued action. The controller's per-entity results are
    /// returned unchanged.
    pub async fn cancel_action(&self, tag: &ActionTag) -> Result<Vec<ActionResult>, CoreError> {
        let request = RpcRequest::action_entities("Cancel", [tag.as_str()])?;
        let results: ActionResults = decode(self.session.call(request).await?)?;
        info!(tag = %tag, results = results.results.len(), "cancel requested");
        Ok(results.results)
    }

    // ── List ─────────────────────────────────────────────────────

    /// Every action recorded against the units of one service, or of
    /// all services.
    pub async fn list_actions(&self, service: Option<&str>) -> Result<Vec<ReceiverActions>, CoreError> {
        let topology = self.get_service_units().await?;

        let selected: Vec<_> = match service {
            Some(name) => {
                if !topology.contains_key(name) {
                    debug!(service = name, "service not in topology");
                }
                topology.get(name).into_iter().collect()
            }
            None => topology.values().collect(),
        };

        // A unit can only appear once in the request.
        let unit_tags: BTreeSet<String> = selected
            .into_iter()
            .flat_map(|units| units.keys())
            .map(|unit| unit_tag(unit))
            .collect();

        if unit_tags.is_empty() {
            debug!("no units to list actions for");
            return Ok(Vec::new());
        }

        let request = RpcRequest::action_entities("ListAll", unit_tags)?;
        let listed: ActionsByReceivers = decode(self.session.call(request).await?)?;

        Ok(listed
            .actions
            .into_iter()
            .map(|entry| ReceiverActions {
                actions: entry
                    .actions
                    .into_iter()
                    .filter_map(|result| match ActionRecord::from_result(result) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            warn!(receiver = %entry.receiver, error = %e, "skipping action result");
                            None
                        }
                    })
                    .collect(),
                error: entry.error.map(|e| e.message),
                receiver: entry.receiver,
            })
            .collect())
    }

    // ── Annotations ──────────────────────────────────────────────

    /// Annotations of each named service.
    pub async fn get_annotations<N: AsRef<str>>(
        &self,
        services: &[N],
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>, CoreError> {
        let mut annotations = BTreeMap::new();
        for service in services {
            let service = service.as_ref();
            let request = RpcRequest::new(
                facade::CLIENT,
                "GetAnnotations",
                &Entity {
                    tag: service_tag(service),
                },
            )?;
            let result: AnnotationsResult = decode(self.session.call(request).await?)?;
            annotations.insert(service.to_owned(), result.annotations);
        }
        Ok(annotations)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Close the session. Other clones see a closed session afterwards.
    pub async fn close(self) -> Result<(), CoreError> {
        self.session.close().await?;
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn controller_error(body: Option<&ErrorBody>) -> Option<CoreError> {
    let body = body.filter(|b| !b.message.is_empty())?;
    Some(CoreError::Rpc {
        message: body.message.clone(),
        code: Some(body.code.clone()).filter(|c| !c.is_empty()),
    })
}

/// Find the action result whose `action.tag` equals `tag` anywhere in
/// the untyped part of a status snapshot.
fn scan_for_action(snapshot: &StatusSnapshot, tag: &ActionTag) -> Option<ActionResult> {
    let mut candidates = Vec::new();
    for value in snapshot.other.values() {
        collect_objects(value, STATUS_SCAN_DEPTH, &mut candidates);
    }

    candidates.into_iter().find_map(|candidate| {
        let result = ActionResult::deserialize(candidate).ok()?;
        let matches = result.action.as_ref().is_some_and(|a| a.tag == tag.as_str());
        matches.then_some(result)
    })
}

fn collect_objects<'a>(value: &'a Value, depth: usize, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            out.push(value);
            if depth > 0 {
                for child in map.values() {
                    collect_objects(child, depth - 1, out);
                }
            }
        }
        Value::Array(items) if depth > 0 => {
            for item in items {
                collect_objects(item, depth - 1, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: Value) -> StatusSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn scan_finds_exact_tag_in_list() {
        let snap = snapshot(json!({
            "Services": {},
            "Actions": [
                { "action": { "tag": "action-10" }, "status": "completed" },
                { "action": { "tag": "action-1" }, "status": "running" }
            ]
        }));

        let found = scan_for_action(&snap, &ActionTag::new("action-1")).unwrap();
        assert_eq!(found.status, "running");
    }

    #[test]
    fn scan_finds_keyed_records() {
        let snap = snapshot(json!({
            "Actions": {
                "a": { "action": { "tag": "action-7" }, "status": "failed" }
            }
        }));
        assert!(scan_for_action(&snap, &ActionTag::new("7")).is_some());
    }

    #[test]
    fn scan_ignores_services_and_misses() {
        let snap = snapshot(json!({
            "Services": {
                "x": { "action": { "tag": "action-1" }, "status": "completed" }
            },
            "Machines": { "0": { "AgentState": "started" } }
        }));
        assert!(scan_for_action(&snap, &ActionTag::new("action-1")).is_none());
    }

    #[test]
    fn controller_error_needs_message() {
        assert!(controller_error(None).is_none());
        let empty = ErrorBody {
            message: String::new(),
            code: String::new(),
        };
        assert!(controller_error(Some(&empty)).is_none());

        let body = ErrorBody {
            message: "no such action".into(),
            code: String::new(),
        };
        match controller_error(Some(&body)) {
            Some(CoreError::Rpc { message, code }) => {
                assert_eq!(message, "no such action");
                assert_eq!(code, None);
            }
            other => panic!("expected Rpc, got {other:?}"),
        }
    }
}
