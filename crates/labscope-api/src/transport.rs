// Shared transport configuration for building reqwest::Client instances.
//
// The REST (NSX) and SOAP (vSphere) clients share TLS settings and host
// resolution through this module. Neither client keeps a cookie jar: SOAP
// session cookies are captured and replayed explicitly by the caller.

use std::path::PathBuf;

use url::Url;

use crate::error::Error;

/// Environment toggle for REST request/response diagnostics.
pub const DEBUG_REST_ENV: &str = "LABSCOPE_DEBUG_REST";

/// Environment toggle for SOAP request/response diagnostics.
pub const DEBUG_SOAP_ENV: &str = "LABSCOPE_DEBUG_SOAP";

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab management endpoints are self-signed).
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
///
/// No request timeout is applied here; callers that want one race the
/// operation against their own timer.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            user_agent: concat!("labscope/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent.as_str());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Same config with a different TLS mode.
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }
}

/// Turn a user-supplied host into a base URL.
///
/// A bare hostname (`vc.lab`, `10.0.0.5:8443`) is reached over HTTPS. A value
/// that already carries an `http://` or `https://` scheme is used as given.
pub fn base_url(host: &str) -> Result<Url, Error> {
    let host = host.trim().trim_end_matches('/');
    let lower = host.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        Ok(Url::parse(host)?)
    } else {
        Ok(Url::parse(&format!("https://{host}"))?)
    }
}

/// Read a boolean diagnostics toggle from the environment.
pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
