//! CLI configuration: a thin layer over `jujuact_config`.
//!
//! Resolves the active profile and applies `GlobalOpts` flag overrides
//! (--endpoint, --user, --password, --insecure, --timeout) on top of it.

use std::time::Duration;

use secrecy::SecretString;

use jujuact_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use jujuact_config::{
    Config, Profile, api_addresses_from_env, config_path, load_config, save_config,
};

/// Everything a command needs to reach the controller.
#[derive(Debug)]
pub struct Connection {
    pub client: ClientConfig,
    pub profile: String,
    pub timeout: Duration,
}

/// Resolve the connection for this invocation from the config file,
/// `JUJU_API_ADDRESSES` and the global flags.
pub fn resolve_connection(global: &GlobalOpts) -> Result<Connection, CliError> {
    let cfg = load_config()?;
    resolve_with(global, &cfg, api_addresses_from_env)
}

fn resolve_with(
    global: &GlobalOpts,
    cfg: &Config,
    env_addresses: impl FnOnce() -> Vec<String>,
) -> Result<Connection, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    // An explicitly requested profile must exist; the implicit default may not.
    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(cfg),
            });
        }
        None => &fallback,
    };

    // 1. Endpoint (flag > env > profile), else API addresses
    let endpoint = global
        .endpoint
        .as_deref()
        .or(profile.endpoint.as_deref())
        .map(|raw| {
            raw.parse::<url::Url>().map_err(|_| CliError::Validation {
                field: "endpoint".into(),
                reason: format!("invalid URL: {raw}"),
            })
        })
        .transpose()?;

    let addresses = profile.addresses.clone().unwrap_or_else(env_addresses);

    if endpoint.is_none() && addresses.iter().all(|a| a.trim().is_empty()) {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    // 2. Credentials (flag first, then the profile's chain)
    let secret = match global.password {
        Some(ref password) => SecretString::from(password.clone()),
        None => jujuact_config::resolve_password(profile, &profile_name)?,
    };
    let user = global.user.as_deref().unwrap_or_else(|| profile.user());

    // 3. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        jujuact_config::resolve_tls(profile)
    };

    // 4. Timeout (flag > env > profile > defaults)
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(cfg.defaults.timeout);

    let mut client = ClientConfig::new(user, secret)
        .with_addresses(addresses)
        .with_tls(tls);
    if let Some(endpoint) = endpoint {
        client = client.with_endpoint(endpoint);
    }

    tracing::debug!(
        profile = %profile_name,
        user = %client.user,
        timeout_secs = timeout,
        "resolved connection"
    );

    Ok(Connection {
        client,
        profile: profile_name,
        timeout: Duration::from_secs(timeout),
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["jujuact"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn no_addresses() -> Vec<String> {
        Vec::new()
    }

    fn lab_config() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                addresses: Some(vec!["10.0.3.1:17070".into()]),
                user: Some("ops".into()),
                password: Some("from-profile".into()),
                timeout: Some(12),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_alone_are_enough() {
        let conn = resolve_with(
            &global(&["-e", "wss://10.0.3.9:17070/", "--password", "pw"]),
            &Config::default(),
            no_addresses,
        )
        .unwrap();

        assert_eq!(conn.profile, "default");
        assert_eq!(conn.client.auth_tag(), "user-admin");
        assert_eq!(conn.client.secret.expose_secret(), "pw");
        assert_eq!(conn.timeout, Duration::from_secs(30));
        assert_eq!(
            conn.client.resolve_endpoint().unwrap().as_str(),
            "wss://10.0.3.9:17070/"
        );
    }

    #[test]
    fn env_addresses_fill_in_missing_endpoint() {
        let conn = resolve_with(&global(&["--password", "pw"]), &Config::default(), || {
            vec!["10.0.3.4:17070".into()]
        })
        .unwrap();
        assert_eq!(
            conn.client.resolve_endpoint().unwrap().as_str(),
            "wss://10.0.3.4:17070/"
        );
    }

    #[test]
    fn profile_values_apply_under_flags() {
        let cfg = lab_config();

        let conn = resolve_with(&global(&["-p", "lab"]), &cfg, no_addresses).unwrap();
        assert_eq!(conn.client.user, "ops");
        assert_eq!(conn.client.secret.expose_secret(), "from-profile");
        assert_eq!(conn.timeout, Duration::from_secs(12));
        assert_eq!(conn.client.tls, TlsVerification::DangerAcceptInvalid);

        let conn = resolve_with(
            &global(&["-p", "lab", "-u", "admin", "--timeout", "3"]),
            &cfg,
            no_addresses,
        )
        .unwrap();
        assert_eq!(conn.client.user, "admin");
        assert_eq!(conn.timeout, Duration::from_secs(3));
    }

    #[test]
    fn explicit_missing_profile_is_an_error() {
        let err = resolve_with(&global(&["-p", "prod"]), &lab_config(), no_addresses).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "lab");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn nothing_to_dial_is_no_config() {
        let err = resolve_with(&global(&["--password", "pw"]), &Config::default(), no_addresses)
            .unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn malformed_endpoint_is_validation() {
        let err = resolve_with(
            &global(&["-e", "not a url", "--password", "pw"]),
            &Config::default(),
            no_addresses,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "endpoint"));
    }

    #[test]
    fn insecure_flag_overrides_profile_tls() {
        let mut cfg = lab_config();
        if let Some(profile) = cfg.profiles.get_mut("lab") {
            profile.insecure = Some(false);
        }

        let strict = resolve_with(&global(&["-p", "lab"]), &cfg, no_addresses).unwrap();
        assert_eq!(strict.client.tls, TlsVerification::SystemDefaults);

        let loose = resolve_with(&global(&["-p", "lab", "-k"]), &cfg, no_addresses).unwrap();
        assert_eq!(loose.client.tls, TlsVerification::DangerAcceptInvalid);
    }
}
