// ── Core error types ──
//
// User-facing errors from labscope-core. Consumers never see HTTP status
// codes or SOAP faults directly; `From<labscope_api::Error>` maps the
// transport-layer kinds onto these.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {host}: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    /// The server answered, but not in a shape we understand.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A verification request body was missing fields or not JSON.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<labscope_api::Error> for CoreError {
    fn from(err: labscope_api::Error) -> Self {
        use labscope_api::Error as Api;

        match err {
            Api::InvalidCredentials => CoreError::AuthenticationFailed {
                message: "invalid username or password".into(),
            },
            e @ Api::LoginFailed { .. } => CoreError::AuthenticationFailed {
                message: e.to_string(),
            },
            Api::Unreachable { host, reason } => CoreError::ConnectionFailed { host, reason },
            e @ Api::MalformedResponse { .. } => CoreError::Protocol {
                message: e.to_string(),
            },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        host: e
                            .url()
                            .and_then(|u| u.host_str().map(str::to_owned))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid host: {e}"),
            },
            Api::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            Api::Deserialization { message, body: _ } => CoreError::Protocol { message },
        }
    }
}

impl CoreError {
    /// Returns `true` for credential rejections.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }
}
