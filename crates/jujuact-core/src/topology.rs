// ── Service topology ──
//
// Rebuilds service → units from a status snapshot. Subordinate services
// report no units of their own: their units live under each principal
// unit's `Subordinates`, so they are collected from the services named in
// `SubordinateTo`.

use std::collections::BTreeMap;

use jujuact_api::models::{ServiceStatus, StatusSnapshot, UnitStatus};

use crate::model::ServiceUnits;

/// Map every service in `snapshot` to the units it owns.
///
/// A service with direct units gets exactly those. A service with none
/// but with principals gets every subordinate unit named `<service>/…`
/// found on the principals' units. Principals missing from the snapshot
/// are skipped.
pub fn resolve(snapshot: &StatusSnapshot) -> ServiceUnits {
    snapshot
        .services
        .iter()
        .map(|(name, service)| (name.clone(), units_of(snapshot, name, service)))
        .collect()
}

fn units_of(
    snapshot: &StatusSnapshot,
    name: &str,
    service: &ServiceStatus,
) -> BTreeMap<String, UnitStatus> {
    if !service.units.is_empty() || service.subordinate_to.is_empty() {
        return service.units.clone();
    }

    // Unit names are `<service>/<n>`; matching on the separator keeps
    // `nrpe` from claiming `nrpe-external/0`.
    let prefix = format!("{name}/");
    let mut units = BTreeMap::new();

    for principal in &service.subordinate_to {
        let Some(principal_status) = snapshot.services.get(principal) else {
            tracing::warn!(service = name, principal = %principal, "principal service missing from status");
            continue;
        };
        for unit in principal_status.units.values() {
            units.extend(
                unit.subordinates
                    .iter()
                    .filter(|(sub_name, _)| sub_name.starts_with(&prefix))
                    .map(|(sub_name, sub)| (sub_name.clone(), sub.clone())),
            );
        }
    }

    units
}
