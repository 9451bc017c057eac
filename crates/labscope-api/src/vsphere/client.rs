// vSphere SOAP client and session
//
// `VsphereClient` is the unauthenticated handle: it knows the host and owns
// the HTTP client. `connect()` (see auth.rs) turns it into a
// `VsphereSession`, an immutable record of the cookies and object
// references every inventory query needs. Inventory operations are
// implemented as inherent methods on the session in separate files.

use url::Url;

use crate::error::Error;
use crate::soap::SoapClient;
use crate::transport::{self, TransportConfig};
use crate::vsphere::models::ManagedObjectRef;

/// Unauthenticated vSphere endpoint.
#[derive(Debug, Clone)]
pub struct VsphereClient {
    soap: SoapClient,
    host: String,
}

impl VsphereClient {
    /// Create a client for `host` (bare hostname or full base URL).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            soap: SoapClient::new(host, transport)?,
            host: host.to_owned(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, host: &str) -> Result<Self, Error> {
        let base_url: Url = transport::base_url(host)?;
        Ok(Self {
            soap: SoapClient::with_client(http, &base_url)?,
            host: host.to_owned(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn soap(&self) -> &SoapClient {
        &self.soap
    }
}

/// An authenticated vSphere session.
///
/// Never mutated after `connect`; refreshing inventory reuses the same
/// session. Safe to share across concurrent queries.
#[derive(Debug, Clone)]
pub struct VsphereSession {
    pub(crate) soap: SoapClient,
    pub(crate) host: String,
    pub(crate) cookies: Vec<String>,
    pub(crate) version: String,
    pub(crate) api_version: String,
    pub(crate) session_manager: ManagedObjectRef,
    pub(crate) property_collector: ManagedObjectRef,
    pub(crate) root_folder: ManagedObjectRef,
}

impl VsphereSession {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Display version: product full name without the `VMware vCenter
    /// Server` prefix, or the raw API version when no full name was sent.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Raw `about.version` from the service content.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Session cookies as `name=value` pairs.
    pub fn cookies(&self) -> &[String] {
        &self.cookies
    }

    pub fn property_collector(&self) -> &ManagedObjectRef {
        &self.property_collector
    }

    pub fn root_folder(&self) -> &ManagedObjectRef {
        &self.root_folder
    }
}
