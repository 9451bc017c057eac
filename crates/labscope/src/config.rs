//! Endpoint resolution: config profile + global flag overrides.
//!
//! Profile storage and credential lookup live in `labscope-config`; this
//! module only layers `--host`, `--username`, `--password`, `--insecure`,
//! `--ca-cert` and `--timeout` on top and checks the profile kind.

use std::io::IsTerminal;

use secrecy::SecretString;

use labscope_config::{self as config, Config, EndpointKind, Profile};
use labscope_core::{EndpointConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// An endpoint ready to connect, plus the operation timeout that applies.
#[derive(Debug)]
pub struct ResolvedEndpoint {
    pub endpoint: EndpointConfig,
    pub profile: Option<String>,
    pub timeout: Option<u64>,
}

/// Load the config file and resolve the endpoint for a `kind` command.
pub fn load_endpoint(global: &GlobalOpts, kind: EndpointKind) -> Result<ResolvedEndpoint, CliError> {
    let cfg = config::load_config_or_default();
    resolve_endpoint(global, &cfg, kind)
}

/// Resolve the endpoint from `cfg` and the global flags.
///
/// An explicitly requested profile of the wrong kind is an error; a default
/// profile of the wrong kind is ignored so flags alone can drive the command.
pub fn resolve_endpoint(
    global: &GlobalOpts,
    cfg: &Config,
    kind: EndpointKind,
) -> Result<ResolvedEndpoint, CliError> {
    let profile = match cfg.active_profile_name(global.profile.as_deref()) {
        Some(name) => match cfg.profiles.get(name) {
            Some(p) if p.kind == kind => Some((name, p)),
            Some(p) if global.profile.is_some() => {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: format!("'{name}' is a {} profile, not {kind}", p.kind),
                });
            }
            Some(_) => None,
            None if global.profile.is_some() => {
                return Err(CliError::ProfileNotFound {
                    name: name.into(),
                    available: available_profiles(cfg),
                });
            }
            None => None,
        },
        None => None,
    };

    match profile {
        Some((name, p)) => from_profile(global, cfg, name, p),
        None => from_flags(global, cfg, kind),
    }
}

fn from_profile(
    global: &GlobalOpts,
    cfg: &Config,
    name: &str,
    profile: &Profile,
) -> Result<ResolvedEndpoint, CliError> {
    let mut effective = profile.clone();
    if let Some(ref host) = global.host {
        effective.host.clone_from(host);
    }
    if let Some(ref user) = global.username {
        effective.username = Some(user.clone());
    }
    if let Some(ref ca) = global.ca_cert {
        effective.ca_cert = Some(ca.clone());
    } else if global.insecure {
        effective.ca_cert = None;
        effective.insecure = Some(true);
    }

    let endpoint = match global.password {
        Some(ref pw) => EndpointConfig::new(
            require_host(effective.host.clone())?,
            config::resolve_username(&effective, name)?,
            SecretString::from(pw.clone()),
        )
        .with_tls(config::resolve_tls(&effective, &cfg.defaults)),
        None => config::profile_to_endpoint(&effective, name, &cfg.defaults)?,
    };

    Ok(ResolvedEndpoint {
        endpoint,
        profile: Some(name.to_owned()),
        timeout: global.timeout.or(profile.timeout).or(cfg.defaults.timeout),
    })
}

fn from_flags(
    global: &GlobalOpts,
    cfg: &Config,
    kind: EndpointKind,
) -> Result<ResolvedEndpoint, CliError> {
    let host = global.host.clone().ok_or_else(|| CliError::NoConfig {
        kind: kind.to_string(),
        path: config::config_path().display().to_string(),
    })?;
    let username = global.username.clone().ok_or_else(|| CliError::NoCredentials {
        profile: "(none)".into(),
    })?;
    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => prompt_password(&username, &host)?,
    };

    let tls = flag_tls(global).unwrap_or(if cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    });

    Ok(ResolvedEndpoint {
        endpoint: EndpointConfig::new(require_host(host)?, username, password).with_tls(tls),
        profile: None,
        timeout: global.timeout.or(cfg.defaults.timeout),
    })
}

/// TLS policy from flags alone. `--ca-cert` beats `--insecure`.
pub(crate) fn flag_tls(global: &GlobalOpts) -> Option<TlsVerification> {
    if let Some(ref ca) = global.ca_cert {
        Some(TlsVerification::CustomCa(ca.clone()))
    } else if global.insecure {
        Some(TlsVerification::DangerAcceptInvalid)
    } else {
        None
    }
}

fn require_host(host: String) -> Result<String, CliError> {
    if host.trim().is_empty() {
        Err(CliError::Validation {
            field: "host".into(),
            reason: "host cannot be empty".into(),
        })
    } else {
        Ok(host)
    }
}

/// Ask for a password on the terminal; never blocks a non-interactive run.
fn prompt_password(username: &str, host: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: "(none)".into(),
        });
    }
    let pw = rpassword::prompt_password(format!("Password for {username}@{host}: "))?;
    Ok(SecretString::from(pw))
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
