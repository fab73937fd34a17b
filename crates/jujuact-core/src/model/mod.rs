// ── Domain model ──

pub mod action;
pub mod spec;
pub mod tag;

pub use action::{ActionRecord, ActionStatus, ReceiverActions};
pub use spec::{ActionProperty, ActionSpec, PropertyType};
pub use tag::{ActionTag, receiver_tag, service_name, service_tag, unit_tag, user_tag};

/// Resolved topology: service name → unit name → unit data.
pub type ServiceUnits =
    std::collections::BTreeMap<String, std::collections::BTreeMap<String, jujuact_api::models::UnitStatus>>;

/// Parsed action specs: service name → action name → spec.
pub type ServiceSpecs =
    std::collections::BTreeMap<String, std::collections::BTreeMap<String, ActionSpec>>;
