//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use labscope_config::ConfigError;
use labscope_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {host}")]
    #[diagnostic(
        code(labscope::connection_failed),
        help(
            "{reason}\n\
             Check that the host is reachable on HTTPS (443).\n\
             For self-signed certificates use --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { host: String, reason: String },

    #[error("Verification could not connect to {host}: {reason}")]
    #[diagnostic(code(labscope::not_connected))]
    NotConnected { host: String, reason: String },

    #[error("{failed} verification check(s) failed")]
    #[diagnostic(code(labscope::checks_failed))]
    ChecksFailed { failed: usize },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(labscope::auth_failed),
        help(
            "Verify the username and password for this endpoint.\n\
             Run: labscope config set-password --profile <name>"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(labscope::no_credentials),
        help(
            "Configure credentials with: labscope config init\n\
             Or pass --username/--password (LABSCOPE_USERNAME / LABSCOPE_PASSWORD)."
        )
    )]
    NoCredentials { profile: String },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(labscope::protocol),
        help("Re-run with -vv and LABSCOPE_DEBUG_SOAP=1 or LABSCOPE_DEBUG_REST=1 to see the exchange.")
    )]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(labscope::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(labscope::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: labscope config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No {kind} endpoint configured")]
    #[diagnostic(
        code(labscope::no_config),
        help(
            "Pass --host (LABSCOPE_HOST), or create a profile with: labscope config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { kind: String, path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(labscope::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Operation timed out after {seconds}s")]
    #[diagnostic(
        code(labscope::timeout),
        help("Increase the limit with --timeout or check that the endpoint is responsive.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(labscope::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, reason } => {
                CliError::ConnectionFailed { host, reason }
            }
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Protocol { message } => CliError::Protocol { message },
            CoreError::InvalidRequest { message } => CliError::Validation {
                field: "request".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(unknown)".into(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let auth: CliError = CoreError::AuthenticationFailed {
            message: "invalid username or password".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let conn: CliError = CoreError::ConnectionFailed {
            host: "vc.lab".into(),
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(conn.exit_code(), exit_code::CONNECTION);

        let timeout: CliError = CoreError::Timeout { timeout_secs: 5 }.into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let bad: CliError = CoreError::InvalidRequest {
            message: "hostname is required".into(),
        }
        .into();
        assert_eq!(bad.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn missing_credentials_are_an_auth_failure() {
        let err: CliError = ConfigError::NoCredentials {
            profile: "lab".into(),
        }
        .into();
        assert_eq!(err.to_string(), "No credentials configured for profile 'lab'");
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn failed_checks_are_a_general_failure() {
        assert_eq!(CliError::ChecksFailed { failed: 2 }.exit_code(), exit_code::GENERAL);
    }
}
