//! Shared configuration for jujuact.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), API
//! address discovery from `JUJU_API_ADDRESSES`, and translation to
//! `jujuact_core::ClientConfig`. The CLI layers its global flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jujuact_core::{ClientConfig, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "jujuact";

/// Whitespace-separated `host:port` list exported by `juju run` hooks.
pub const API_ADDRESSES_ENV: &str = "JUJU_API_ADDRESSES";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "JUJUACT_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the override, else `default_profile`,
    /// else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }
}

#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Per-operation timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// WebSocket endpoint (e.g. "wss://10.0.3.1:17070/").
    pub endpoint: Option<String>,

    /// `host:port` API addresses, tried when no endpoint is set.
    pub addresses: Option<Vec<String>>,

    /// User name or tag; defaults to "admin".
    pub user: Option<String>,

    /// Password (plaintext: prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Path to the controller's CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override TLS verification. `false` with no `ca_cert` uses the
    /// bundled web PKI roots.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("admin")
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `JUJUACT_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "jujuact", "jujuact").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("jujuact");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file: defaults, then the file, then
/// `JUJUACT_`-prefixed env vars (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    tracing::debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("JUJUACT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── API addresses ───────────────────────────────────────────────────

/// Split a `JUJU_API_ADDRESSES` value into addresses.
pub fn parse_api_addresses(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

/// Addresses from `JUJU_API_ADDRESSES`, empty when unset.
pub fn api_addresses_from_env() -> Vec<String> {
    std::env::var(API_ADDRESSES_ENV)
        .map(|raw| parse_api_addresses(&raw))
        .unwrap_or_default()
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_account(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Resolve the login password: the profile's `password_env`, then the
/// system keyring, then plaintext in the config.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |var| std::env::var(var).ok(),
        |account| {
            keyring::Entry::new(KEYRING_SERVICE, account)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. System keyring
    if let Some(pw) = keyring(&keyring_account(profile_name)) {
        return Ok(SecretString::from(pw));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Translation to ClientConfig ─────────────────────────────────────

/// TLS strategy for a profile.
///
/// `insecure = true` always skips verification; otherwise a CA file wins;
/// `insecure = false` without a CA uses web PKI roots; unset falls back
/// to accepting the controller's self-signed certificate.
pub fn resolve_tls(profile: &Profile) -> TlsVerification {
    match (profile.insecure, &profile.ca_cert) {
        (Some(true), _) => TlsVerification::DangerAcceptInvalid,
        (_, Some(ca_path)) => TlsVerification::CustomCa(ca_path.clone()),
        (Some(false), None) => TlsVerification::SystemDefaults,
        (None, None) => TlsVerification::DangerAcceptInvalid,
    }
}

/// Build a `ClientConfig` from a profile, with no CLI flag overrides.
///
/// Addresses come from the profile, else from `JUJU_API_ADDRESSES`.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    let secret = resolve_password(profile, profile_name)?;
    let addresses = profile
        .addresses
        .clone()
        .unwrap_or_else(api_addresses_from_env);
    build_client_config(profile, secret, addresses)
}

fn build_client_config(
    profile: &Profile,
    secret: SecretString,
    addresses: Vec<String>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::new(profile.user(), secret)
        .with_addresses(addresses)
        .with_tls(resolve_tls(profile));

    if let Some(ref endpoint) = profile.endpoint {
        let url = endpoint.parse().map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {endpoint}"),
        })?;
        config = config.with_endpoint(url);
    }

    Ok(config)
}
