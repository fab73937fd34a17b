//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext password.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        if let Some(ref endpoint) = p.endpoint {
            let _ = writeln!(out, "endpoint = \"{endpoint}\"");
        }
        if let Some(ref addresses) = p.addresses {
            let quoted: Vec<_> = addresses.iter().map(|a| format!("\"{a}\"")).collect();
            let _ = writeln!(out, "addresses = [{}]", quoted.join(", "));
        }
        let _ = writeln!(out, "user = \"{}\"", p.user());
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "endpoint" => {
            value.parse::<url::Url>().map_err(|_| CliError::Validation {
                field: "endpoint".into(),
                reason: format!("invalid URL: {value}"),
            })?;
            profile.endpoint = Some(value.into());
        }
        "addresses" => {
            let addresses: Vec<String> = value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|a| !a.is_empty())
                .map(str::to_owned)
                .collect();
            profile.addresses = (!addresses.is_empty()).then_some(addresses);
        }
        "user" => profile.user = Some(value.into()),
        "password_env" | "password-env" => profile.password_env = Some(value.into()),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", value)?),
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "password" => {
            return Err(CliError::Validation {
                field: "password".into(),
                reason: "use 'jujuact config set-password' to store passwords".into(),
            });
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: endpoint, addresses, user, \
                     password_env, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    Ok(())
}

fn require_profile<'a>(cfg: &'a Config, name: &str) -> Result<&'a Profile, CliError> {
    cfg.profiles.get(name).ok_or_else(|| CliError::ProfileNotFound {
        name: name.into(),
        available: config::available_profiles(cfg),
    })
}

// ── Wizard ──────────────────────────────────────────────────────────

fn init_wizard() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("jujuact configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config()?;

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Controller address
    let address: String = Input::new()
        .with_prompt("Controller API address (host:port)")
        .default("10.0.3.1:17070".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Login
    let user: String = Input::new()
        .with_prompt("User")
        .default("admin".into())
        .interact_text()
        .map_err(prompt_err)?;
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let storage = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let plaintext = if storage == 0 {
        jujuact_config::store_password(&profile_name, &password)?;
        eprintln!("   Password stored in system keyring");
        None
    } else {
        Some(password)
    };

    // 4. TLS
    let self_signed = Confirm::new()
        .with_prompt("Accept the controller's self-signed certificate?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            addresses: Some(vec![address]),
            user: Some(user),
            password: plaintext,
            insecure: Some(self_signed),
            ..Profile::default()
        },
    );
    if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }

    config::save_config(&cfg)?;
    eprintln!("\nProfile '{profile_name}' saved to {}", config_path.display());
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init_wizard(),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = cfg.active_profile_name(global.profile.as_deref());

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, &value)?;
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }

            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.active_profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: jujuact config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            require_profile(&cfg, &name)?;

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile
                .or_else(|| global.profile.clone())
                .unwrap_or_else(|| cfg.active_profile_name(None));
            require_profile(&cfg, &profile_name)?;

            let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            jujuact_config::store_password(&profile_name, &password)?;

            if !global.quiet {
                eprintln!("Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keys_update_profile() {
        let mut p = Profile::default();
        set_profile_key(&mut p, "endpoint", "wss://10.0.3.1:17070/").unwrap();
        set_profile_key(&mut p, "addresses", "10.0.3.1:17070, 10.0.3.2:17070").unwrap();
        set_profile_key(&mut p, "insecure", "false").unwrap();
        set_profile_key(&mut p, "timeout", "9").unwrap();

        assert_eq!(p.endpoint.as_deref(), Some("wss://10.0.3.1:17070/"));
        assert_eq!(
            p.addresses,
            Some(vec!["10.0.3.1:17070".to_owned(), "10.0.3.2:17070".to_owned()])
        );
        assert_eq!(p.insecure, Some(false));
        assert_eq!(p.timeout, Some(9));
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut p = Profile::default();
        assert!(set_profile_key(&mut p, "endpoint", "no scheme").is_err());
        assert!(set_profile_key(&mut p, "insecure", "maybe").is_err());
        assert!(set_profile_key(&mut p, "password", "hunter2").is_err());
        assert!(set_profile_key(&mut p, "colour", "red").is_err());
        assert_eq!(p, Profile::default());
    }

    #[test]
    fn redacted_view_masks_password() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                password: Some("its-a-secret".into()),
                password_env: Some("LAB_PW".into()),
                ..Profile::default()
            },
        );
        let shown = format_config_redacted(&cfg);
        assert!(shown.contains("[profiles.lab]"));
        assert!(shown.contains("password = \"****\""));
        assert!(shown.contains("password_env = \"LAB_PW\""));
        assert!(!shown.contains("its-a-secret"));
    }
}
