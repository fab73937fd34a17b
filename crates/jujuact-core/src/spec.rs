// ── Action spec parsing ──
//
// Turns a `ServicesCharmActions` response into typed specs keyed by
// service name and action name.

use std::collections::BTreeMap;

use jujuact_api::models::{ActionSpecDef, PropertySchema, ServicesCharmActionsResults};
use serde_json::Value;

use crate::model::{ActionProperty, ActionSpec, PropertyType, ServiceSpecs, service_name};

/// Parse every service's declared actions.
///
/// Services whose charm declares no actions (or whose entry carries an
/// error) map to an empty spec table rather than failing the call.
pub fn parse_action_specs(results: &ServicesCharmActionsResults) -> ServiceSpecs {
    results
        .results
        .iter()
        .map(|entry| {
            let service = service_name(&entry.servicetag).to_owned();

            if let Some(err) = &entry.error {
                tracing::warn!(service = %service, error = %err.message, "charm actions unavailable");
            }

            let specs = match entry.actions.as_ref().and_then(|a| a.action_specs.as_ref()) {
                Some(defs) => defs
                    .iter()
                    .map(|(name, def)| (name.clone(), parse_spec(name, def)))
                    .collect(),
                None => {
                    tracing::debug!(service = %service, "charm declares no actions");
                    BTreeMap::new()
                }
            };

            (service, specs)
        })
        .collect()
}

fn parse_spec(name: &str, def: &ActionSpecDef) -> ActionSpec {
    let params = &def.params;
    let description = params
        .description
        .clone()
        .or_else(|| Some(def.description.clone()).filter(|d| !d.is_empty()))
        .unwrap_or_default();

    ActionSpec {
        name: name.to_owned(),
        title: params.title.clone().unwrap_or_default(),
        description,
        properties: params
            .properties
            .iter()
            .map(|(prop_name, schema)| (prop_name.clone(), parse_property(prop_name, schema)))
            .collect(),
    }
}

fn parse_property(name: &str, schema: &PropertySchema) -> ActionProperty {
    let default = schema.default.clone().filter(is_scalar);
    ActionProperty {
        name: name.to_owned(),
        description: schema.description.clone().unwrap_or_default(),
        kind: PropertyType::resolve(schema.kind.as_deref(), default.as_ref()),
        default,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}
