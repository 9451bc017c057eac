// ── Runtime endpoint configuration ──
//
// Describes *how* to reach one vCenter or NSX manager. Carries credentials
// and TLS policy but never touches disk; the CLI resolves profiles and
// hands an `EndpointConfig` in.

use std::path::PathBuf;

use labscope_api::{NsxClient, NsxSession, TlsMode, TransportConfig, VsphereClient, VsphereSession};
use secrecy::SecretString;
use tracing::debug;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Lab managers almost always run self-signed.
    #[default]
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Connection parameters for a single endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Hostname, `host:port`, or full `https://` base URL.
    pub host: String,
    pub username: String,
    pub password: SecretString,
    pub tls: TlsVerification,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password,
            tls: TlsVerification::default(),
        }
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    /// Transport settings derived from this endpoint's TLS policy.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_tls(TlsMode::from(&self.tls))
    }

    /// Authenticate against vSphere.
    pub async fn connect_vsphere(&self) -> Result<VsphereSession, CoreError> {
        debug!(host = %self.host, "connecting to vCenter");
        let client = VsphereClient::new(&self.host, &self.transport())?;
        Ok(client.connect(&self.username, &self.password).await?)
    }

    /// Authenticate against an NSX manager.
    pub async fn connect_nsx(&self) -> Result<NsxSession, CoreError> {
        debug!(host = %self.host, "connecting to NSX manager");
        let client = NsxClient::new(&self.host, &self.transport())?;
        Ok(client.connect(&self.username, &self.password).await?)
    }
}
