// vSphere authentication
//
// `RetrieveServiceContent` (unauthenticated) yields the SessionManager,
// PropertyCollector and root Folder references; `Login` against the
// SessionManager sets the session cookie. Both are fail-fast: any problem
// is reported as one of the connection-establishment error kinds.

use quick_xml::escape::escape;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::Error;
use crate::soap::{VIM25_NS, envelope};
use crate::transport::TransportConfig;
use crate::vsphere::client::{VsphereClient, VsphereSession};
use crate::vsphere::models::ManagedObjectRef;
use crate::xml::extract_tag;

/// Fault marker vSphere puts in the body of a rejected `Login`.
const INVALID_LOGIN_FAULT: &str = "InvalidLogin";

/// Product name prefix dropped from the displayed version.
const VCENTER_PRODUCT_NAME: &str = "VMware vCenter Server";

/// The parts of `ServiceContent` this crate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContent {
    pub session_manager: ManagedObjectRef,
    pub property_collector: ManagedObjectRef,
    pub root_folder: ManagedObjectRef,
    pub version: String,
    pub full_name: String,
}

impl ServiceContent {
    /// Parse a `RetrieveServiceContentResponse` body.
    ///
    /// Fails when any of the three required references is missing.
    pub fn from_xml(xml: &str) -> Result<Self, Error> {
        let required = |tag: &'static str| {
            let value = extract_tag(xml, tag);
            if value.is_empty() {
                Err(Error::MalformedResponse {
                    what: "ServiceContent",
                    reason: format!("missing {tag}"),
                })
            } else {
                Ok(value)
            }
        };

        Ok(Self {
            session_manager: ManagedObjectRef::new("SessionManager", required("sessionManager")?),
            property_collector: ManagedObjectRef::new(
                "PropertyCollector",
                required("propertyCollector")?,
            ),
            root_folder: ManagedObjectRef::new("Folder", required("rootFolder")?),
            version: extract_tag(xml, "version"),
            full_name: extract_tag(xml, "fullName"),
        })
    }

    /// Full product name without the vCenter prefix, else the raw version.
    pub fn display_version(&self) -> String {
        let stripped = self.full_name.replace(VCENTER_PRODUCT_NAME, "");
        let stripped = stripped.trim();
        if stripped.is_empty() {
            self.version.clone()
        } else {
            stripped.to_owned()
        }
    }
}

/// Connect to `host` with the default transport (self-signed certs accepted).
pub async fn connect(
    host: &str,
    username: &str,
    password: &SecretString,
) -> Result<VsphereSession, Error> {
    VsphereClient::new(host, &TransportConfig::default())?
        .connect(username, password)
        .await
}

impl VsphereClient {
    /// Fetch the service content without authenticating.
    pub async fn retrieve_service_content(&self) -> Result<ServiceContent, Error> {
        let body = envelope(&format!(
            r#"<RetrieveServiceContent xmlns="{VIM25_NS}"><_this type="ServiceInstance">ServiceInstance</_this></RetrieveServiceContent>"#
        ));

        let resp = self
            .soap()
            .post(body, "RetrieveServiceContent", &[])
            .await
            .map_err(|e| transport_unreachable(self.host(), e))?;

        if !resp.is_ok() {
            return Err(Error::Unreachable {
                host: self.host().to_owned(),
                reason: format!("service content request returned HTTP {}", resp.status),
            });
        }

        ServiceContent::from_xml(&resp.body)
    }

    /// Authenticate and build a session.
    pub async fn connect(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<VsphereSession, Error> {
        let content = self.retrieve_service_content().await?;
        debug!(
            host = self.host(),
            version = %content.version,
            "retrieved service content"
        );

        let body = envelope(&format!(
            r#"<Login xmlns="{VIM25_NS}"><_this type="SessionManager">{}</_this><userName>{}</userName><password>{}</password></Login>"#,
            escape(content.session_manager.value.as_str()),
            escape(username),
            escape(password.expose_secret()),
        ));

        let resp = self
            .soap()
            .post(body, "Login", &[])
            .await
            .map_err(|e| transport_unreachable(self.host(), e))?;

        if resp.body.contains(INVALID_LOGIN_FAULT) || matches!(resp.status, 401 | 403) {
            return Err(Error::InvalidCredentials);
        }
        if !resp.is_ok() {
            return Err(Error::LoginFailed {
                status: resp.status,
            });
        }

        debug!(host = self.host(), cookies = resp.cookies.len(), "login successful");

        Ok(VsphereSession {
            soap: self.soap().clone(),
            host: self.host().to_owned(),
            cookies: resp.cookies,
            version: content.display_version(),
            api_version: content.version,
            session_manager: content.session_manager,
            property_collector: content.property_collector,
            root_folder: content.root_folder,
        })
    }
}

impl VsphereSession {
    /// End the server-side session. Best effort: a non-200 answer is logged
    /// and ignored, only transport failures are returned.
    pub async fn logout(&self) -> Result<(), Error> {
        let body = envelope(&format!(
            r#"<Logout xmlns="{VIM25_NS}"><_this type="SessionManager">{}</_this></Logout>"#,
            escape(self.session_manager.value.as_str()),
        ));

        let resp = self.soap.post(body, "Logout", &self.cookies).await?;
        if resp.is_ok() {
            debug!(host = %self.host, "logout complete");
        } else {
            warn!(host = %self.host, status = resp.status, "logout rejected");
        }
        Ok(())
    }
}

fn transport_unreachable(host: &str, err: Error) -> Error {
    match err {
        Error::Transport(ref e) => Error::unreachable(host, e),
        other => other,
    }
}
