use thiserror::Error;

/// Top-level error type for the `labscope-api` crate.
///
/// Connection establishment (`connect` on either provider) fails fast with
/// one of the first four variants. Inventory queries made after a successful
/// connect only ever return the transport-level variants; HTTP status
/// failures are folded into empty results by the callers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection establishment ────────────────────────────────────
    /// The server rejected the username/password pair.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login was answered with a non-success status that is not a
    /// credential fault.
    #[error("Login failed (HTTP {status})")]
    LoginFailed { status: u16 },

    /// The endpoint could not be reached, or answered the initial probe
    /// with a non-success status.
    #[error("Unable to connect to {host}: {reason}")]
    Unreachable { host: String, reason: String },

    /// A response was received but lacks fields the protocol requires.
    #[error("Unable to parse {what}: {reason}")]
    MalformedResponse { what: &'static str, reason: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The host could not be turned into a base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable CA file, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the server rejected the supplied credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::LoginFailed { .. })
    }

    /// Returns `true` if the endpoint could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Unreachable { .. } => true,
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Wrap a transport failure that happened while establishing a session.
    pub(crate) fn unreachable(host: &str, err: &reqwest::Error) -> Self {
        Self::Unreachable {
            host: host.to_owned(),
            reason: err.to_string(),
        }
    }
}
