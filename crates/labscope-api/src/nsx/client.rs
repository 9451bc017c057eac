// NSX-T client and session
//
// `connect()` probes `/api/v1/node` with the given credentials. The
// resulting session only caches those credentials; every later request
// authenticates again.

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;
use crate::nsx::models::{ListResult, NodeInfo};
use crate::rest::RestClient;
use crate::transport::{self, TransportConfig};

pub(crate) const NODE_PATH: &str = "/api/v1/node";

/// Unauthenticated NSX manager endpoint.
#[derive(Debug, Clone)]
pub struct NsxClient {
    rest: RestClient,
    host: String,
}

/// Connect to `host` with the default transport (self-signed certs accepted).
pub async fn connect(
    host: &str,
    username: &str,
    password: &SecretString,
) -> Result<NsxSession, Error> {
    NsxClient::new(host, &TransportConfig::default())?
        .connect(username, password)
        .await
}

impl NsxClient {
    /// Create a client for `host` (bare hostname or full base URL).
    pub fn new(host: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            rest: RestClient::new(host, transport)?,
            host: host.to_owned(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, host: &str) -> Result<Self, Error> {
        let base_url = transport::base_url(host)?;
        Ok(Self {
            rest: RestClient::with_client(http, base_url),
            host: host.to_owned(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Verify credentials and read the manager version.
    ///
    /// 401/403 → [`Error::InvalidCredentials`]; any other non-200 or a
    /// network failure → [`Error::Unreachable`].
    pub async fn connect(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<NsxSession, Error> {
        let resp = self
            .rest
            .get(NODE_PATH, username, password)
            .await
            .map_err(|e| match e {
                Error::Transport(ref err) => Error::unreachable(&self.host, err),
                other => other,
            })?;

        match resp.status {
            200 => {}
            401 | 403 => return Err(Error::InvalidCredentials),
            status => {
                return Err(Error::Unreachable {
                    host: self.host.clone(),
                    reason: format!("node info request returned HTTP {status}"),
                });
            }
        }

        let node: NodeInfo =
            serde_json::from_str(&resp.body).map_err(|e| Error::MalformedResponse {
                what: "NSX node info",
                reason: e.to_string(),
            })?;
        let version = node.version();
        debug!(host = %self.host, %version, "connected to NSX manager");

        Ok(NsxSession {
            rest: self.rest.clone(),
            host: self.host.clone(),
            username: username.to_owned(),
            password: password.clone(),
            version,
        })
    }
}

/// Cached NSX credentials plus the manager version.
#[derive(Debug, Clone)]
pub struct NsxSession {
    pub(crate) rest: RestClient,
    pub(crate) host: String,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) version: String,
}

impl NsxSession {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// GET a collection endpoint. Non-200 yields an empty list.
    pub(crate) async fn get_collection<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, Error> {
        let resp = self.rest.get(path, &self.username, &self.password).await?;
        if !resp.is_ok() {
            debug!(path, status = resp.status, "collection request failed, returning no items");
            return Ok(Vec::new());
        }

        let list: ListResult<T> =
            serde_json::from_str(&resp.body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: resp.body.clone(),
            })?;
        Ok(list.results)
    }
}
