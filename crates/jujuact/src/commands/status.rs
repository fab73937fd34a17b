//! Status and unit topology handlers.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use jujuact_core::{ActionClient, UnitStatus};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Charm")]
    charm: String,
    #[tabled(rename = "Exposed")]
    exposed: String,
    #[tabled(rename = "Units")]
    units: String,
    #[tabled(rename = "Subordinate To")]
    subordinate_to: String,
}

#[derive(Serialize)]
struct ServiceEntry {
    name: String,
    charm: String,
    exposed: bool,
    units: usize,
    subordinate_to: Vec<String>,
}

impl From<&ServiceEntry> for ServiceRow {
    fn from(s: &ServiceEntry) -> Self {
        Self {
            name: s.name.clone(),
            charm: s.charm.clone(),
            exposed: if s.exposed { "yes" } else { "no" }.into(),
            units: s.units.to_string(),
            subordinate_to: s.subordinate_to.join(", "),
        }
    }
}

#[derive(Serialize)]
struct UnitEntry<'a> {
    service: &'a str,
    unit: &'a str,
    #[serde(flatten)]
    status: &'a UnitStatus,
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Machine")]
    machine: String,
    #[tabled(rename = "Address")]
    address: String,
}

impl From<&UnitEntry<'_>> for UnitRow {
    fn from(u: &UnitEntry<'_>) -> Self {
        Self {
            service: u.service.to_owned(),
            unit: u.unit.to_owned(),
            state: u.status.agent_state.clone(),
            machine: u.status.machine.clone(),
            address: u.status.public_address.clone(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn status(
    client: &ActionClient,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let snapshot = util::timed(timeout, client.get_status()).await?;

    // Structured formats get the whole snapshot, machines and all.
    if !matches!(global.output, OutputFormat::Table | OutputFormat::Plain) {
        let out = output::render_single(
            &global.output,
            &snapshot,
            |_| String::new(),
            |_| String::new(),
        );
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let services: Vec<ServiceEntry> = snapshot
        .services
        .iter()
        .map(|(name, svc)| ServiceEntry {
            name: name.clone(),
            charm: svc.charm.clone(),
            exposed: svc.exposed,
            units: svc.units.len(),
            subordinate_to: svc.subordinate_to.clone(),
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &services,
        |s| ServiceRow::from(s),
        |s| s.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn units(
    client: &ActionClient,
    service: Option<String>,
    global: &GlobalOpts,
    timeout: Duration,
) -> Result<(), CliError> {
    let topology = util::timed(timeout, client.get_service_units()).await?;

    if let Some(name) = service.as_ref().filter(|name| !topology.contains_key(*name)) {
        return Err(CliError::NotFound {
            resource_type: "service".into(),
            identifier: name.clone(),
            list_command: "status".into(),
        });
    }

    let entries: Vec<UnitEntry<'_>> = topology
        .iter()
        .filter(|(name, _)| service.as_ref().is_none_or(|wanted| wanted == *name))
        .flat_map(|(name, units)| {
            units.iter().map(move |(unit, status)| UnitEntry {
                service: name,
                unit,
                status,
            })
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |u| UnitRow::from(u),
        |u| u.unit.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
