// ── Entity tags ──
//
// The controller addresses every entity by a `<kind>-<id>` tag string.
// Unit names (`redmine/0`) become `unit-redmine-0`; services become
// `service-<name>`; actions are `action-<uuid>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ACTION_PREFIX: &str = "action-";
pub const SERVICE_PREFIX: &str = "service-";
pub const UNIT_PREFIX: &str = "unit-";
pub const USER_PREFIX: &str = "user-";

// ── ActionTag ───────────────────────────────────────────────────────

/// Controller-assigned action identifier, always stored as `action-<id>`.
///
/// Accepts either the full tag or the bare id; the id itself is opaque
/// and never validated as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ActionTag(String);

impl ActionTag {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        if raw.starts_with(ACTION_PREFIX) {
            Self(raw.to_owned())
        } else {
            Self(format!("{ACTION_PREFIX}{raw}"))
        }
    }

    /// Keep a tag the controller reported exactly as it was sent.
    pub fn from_controller(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without the `action-` prefix.
    pub fn id(&self) -> &str {
        self.0.strip_prefix(ACTION_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ActionTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for ActionTag {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ActionTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ActionTag> for String {
    fn from(tag: ActionTag) -> Self {
        tag.0
    }
}

// ── Tag helpers ─────────────────────────────────────────────────────

/// `redmine` → `service-redmine`
pub fn service_tag(service: &str) -> String {
    format!("{SERVICE_PREFIX}{service}")
}

/// `service-redmine` → `redmine`. Tags without the prefix pass through.
pub fn service_name(tag: &str) -> &str {
    tag.strip_prefix(SERVICE_PREFIX).unwrap_or(tag)
}

/// `redmine/0` → `unit-redmine-0`
pub fn unit_tag(unit: &str) -> String {
    format!("{UNIT_PREFIX}{}", unit.replace('/', "-"))
}

/// Normalize a receiver given on the command line or by a caller.
///
/// Unit names (`svc/N`) become unit tags; anything else is assumed to
/// already be a tag and is passed through.
pub fn receiver_tag(receiver: &str) -> String {
    let receiver = receiver.trim();
    if !receiver.starts_with(UNIT_PREFIX) && receiver.contains('/') {
        unit_tag(receiver)
    } else {
        receiver.to_owned()
    }
}

/// `admin` → `user-admin`; existing user tags pass through.
pub fn user_tag(user: &str) -> String {
    if user.starts_with(USER_PREFIX) {
        user.to_owned()
    } else {
        format!("{USER_PREFIX}{user}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tag_from_bare_id() {
        let tag = ActionTag::new("3428e20d-fcd7-4911-803b-9b857a2e5ec9");
        assert_eq!(tag.as_str(), "action-3428e20d-fcd7-4911-803b-9b857a2e5ec9");
        assert_eq!(tag.id(), "3428e20d-fcd7-4911-803b-9b857a2e5ec9");
    }

    #[test]
    fn action_tag_keeps_full_tag() {
        let tag: ActionTag = "action-42".parse().unwrap();
        assert_eq!(tag.to_string(), "action-42");
        assert_eq!(tag.id(), "42");
    }

    #[test]
    fn action_tag_serde_normalizes() {
        let tag: ActionTag = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(tag.as_str(), "action-abc");
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"action-abc\"");
    }

    #[test]
    fn unit_and_service_tags() {
        assert_eq!(unit_tag("redmine/0"), "unit-redmine-0");
        assert_eq!(unit_tag("mysql-slave/12"), "unit-mysql-slave-12");
        assert_eq!(service_tag("redmine"), "service-redmine");
        assert_eq!(service_name("service-redmine"), "redmine");
        assert_eq!(service_name("redmine"), "redmine");
    }

    #[test]
    fn receiver_normalization() {
        assert_eq!(receiver_tag("redmine/0"), "unit-redmine-0");
        assert_eq!(receiver_tag("unit-redmine-0"), "unit-redmine-0");
        assert_eq!(receiver_tag(" unit-nrpe-3 "), "unit-nrpe-3");
    }

    #[test]
    fn user_tag_prefix() {
        assert_eq!(user_tag("admin"), "user-admin");
        assert_eq!(user_tag("user-admin"), "user-admin");
    }
}
