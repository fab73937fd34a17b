//! Action spec discovery handler.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use jujuact_core::{ActionClient, ActionSpec};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct SpecEntry<'a> {
    service: &'a str,
    #[serde(flatten)]
    spec: &'a ActionSpec,
}

#[derive(Tabled)]
struct SpecRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Parameters")]
    params: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&SpecEntry<'_>> for SpecRow {
    fn from(e: &SpecEntry<'_>) -> Self {
        let params = e
            .spec
            .properties
            .values()
            .map(|p| match p.default {
                Some(ref default) => format!("{}:{}={default}", p.name, p.kind),
                None => format!("{}:{}", p.name, p.kind),
            })
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            service: e.service.to_owned(),
            action: e.spec.name.clone(),
            params,
            description: e.spec.description.clone(),
        }
    }
}

pub async fn handle(
    client: &ActionClient,
    service: Option<String>,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let specs = util::timed(timeout, client.get_action_specs(service.as_deref())).await?;

    // An unknown service comes back as an error entry, which leaves nothing.
    if let Some(name) = service.as_ref().filter(|name| !specs.contains_key(*name)) {
        return Err(CliError::NotFound {
            resource_type: "service".into(),
            identifier: name.clone(),
            list_command: "status".into(),
        });
    }

    let entries: Vec<SpecEntry<'_>> = specs
        .iter()
        .flat_map(|(service, actions)| {
            actions.values().map(move |spec| SpecEntry { service, spec })
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| SpecRow::from(e),
        |e| format!("{} {}", e.service, e.spec.name),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
