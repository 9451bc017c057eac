// ── Connection verification handlers ──
//
// Each handler takes a parsed request body (hostname, credentials, optional
// object names), connects, and runs the requested checks concurrently.
// "Could not connect" is a normal response with `connected: false`; only
// failures after a successful connect surface as `Err`.

use labscope_api::{DatastoreInfo, NsxClient, TransportConfig, VsphereClient};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::CoreError;

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn parse_request<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, CoreError> {
    serde_json::from_str(body).map_err(|e| CoreError::InvalidRequest {
        message: e.to_string(),
    })
}

fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::InvalidRequest {
            message: format!("{field} is required"),
        })
    } else {
        Ok(())
    }
}

// ── vCenter ─────────────────────────────────────────────────────────

/// Body of a vCenter verification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcenterVerifyRequest {
    pub hostname: String,
    pub username: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
    #[serde(default)]
    pub datacenter: Option<String>,
    #[serde(default)]
    pub datastore: Option<String>,
    #[serde(default)]
    pub vm_folder: Option<String>,
    #[serde(default)]
    pub resource_pool: Option<String>,
}

impl VcenterVerifyRequest {
    /// Parse and validate a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, CoreError> {
        let req: Self = parse_request(body)?;
        require("hostname", &req.hostname)?;
        require("username", &req.username)?;
        Ok(req)
    }
}

/// Outcome of each requested vCenter check. Unrequested checks stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcenterChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datastore: Option<DatastoreInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_folder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_pool: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcenterVerifyResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub checks: VcenterChecks,
}

impl VcenterVerifyResponse {
    fn disconnected(message: String) -> Self {
        Self {
            connected: false,
            message: Some(message),
            version: None,
            checks: VcenterChecks::default(),
        }
    }
}

/// Connect to vCenter and check every object named in `req`.
pub async fn verify_vcenter(
    req: &VcenterVerifyRequest,
    transport: &TransportConfig,
) -> Result<VcenterVerifyResponse, CoreError> {
    let connected = async {
        VsphereClient::new(&req.hostname, transport)?
            .connect(&req.username, &req.password)
            .await
    };
    let session = match connected.await {
        Ok(session) => session,
        Err(e) => {
            debug!(host = %req.hostname, error = %e, "vCenter verification could not connect");
            return Ok(VcenterVerifyResponse::disconnected(e.to_string()));
        }
    };

    let datacenter = async {
        match req.datacenter.as_deref() {
            Some(name) => session.check_datacenter(name).await.map(Some),
            None => Ok(None),
        }
    };
    let datastore = async {
        match req.datastore.as_deref() {
            Some(name) => session.check_datastore(name).await.map(Some),
            None => Ok(None),
        }
    };
    let vm_folder = async {
        match req.vm_folder.as_deref() {
            Some(name) => session.check_vm_folder(name).await.map(Some),
            None => Ok(None),
        }
    };
    let resource_pool = async {
        match req.resource_pool.as_deref() {
            Some(name) => session
                .list_resource_pools()
                .await
                .map(|pools| Some(pools.iter().any(|p| p.name == name))),
            None => Ok(None),
        }
    };

    let checked = tokio::try_join!(datacenter, datastore, vm_folder, resource_pool);

    if let Err(e) = session.logout().await {
        warn!(host = %req.hostname, error = %e, "vCenter logout failed");
    }
    let (datacenter, datastore, vm_folder, resource_pool) = checked?;

    Ok(VcenterVerifyResponse {
        connected: true,
        message: None,
        version: Some(session.version().to_owned()),
        checks: VcenterChecks {
            datacenter,
            datastore,
            vm_folder,
            resource_pool,
        },
    })
}

// ── NSX ─────────────────────────────────────────────────────────────

/// Body of an NSX verification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsxVerifyRequest {
    pub hostname: String,
    pub username: String,
    #[serde(deserialize_with = "secret")]
    pub password: SecretString,
    #[serde(default)]
    pub transport_zone: Option<String>,
    #[serde(default)]
    pub edge_cluster: Option<String>,
    #[serde(default)]
    pub t0_gateway: Option<String>,
}

impl NsxVerifyRequest {
    /// Parse and validate a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, CoreError> {
        let req: Self = parse_request(body)?;
        require("hostname", &req.hostname)?;
        require("username", &req.username)?;
        Ok(req)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NsxChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_zone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_cluster: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t0_gateway: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NsxVerifyResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub checks: NsxChecks,
}

/// Connect to an NSX manager and check every object named in `req`.
pub async fn verify_nsx(
    req: &NsxVerifyRequest,
    transport: &TransportConfig,
) -> Result<NsxVerifyResponse, CoreError> {
    let connected = async {
        NsxClient::new(&req.hostname, transport)?
            .connect(&req.username, &req.password)
            .await
    };
    let session = match connected.await {
        Ok(session) => session,
        Err(e) => {
            debug!(host = %req.hostname, error = %e, "NSX verification could not connect");
            return Ok(NsxVerifyResponse {
                connected: false,
                message: Some(e.to_string()),
                version: None,
                checks: NsxChecks::default(),
            });
        }
    };

    let transport_zone = async {
        match req.transport_zone.as_deref() {
            Some(name) => session.check_transport_zone(name).await.map(Some),
            None => Ok(None),
        }
    };
    let edge_cluster = async {
        match req.edge_cluster.as_deref() {
            Some(name) => session.check_edge_cluster(name).await.map(Some),
            None => Ok(None),
        }
    };
    let t0_gateway = async {
        match req.t0_gateway.as_deref() {
            Some(name) => session.check_t0(name).await.map(Some),
            None => Ok(None),
        }
    };

    let (transport_zone, edge_cluster, t0_gateway) =
        tokio::try_join!(transport_zone, edge_cluster, t0_gateway)?;

    Ok(NsxVerifyResponse {
        connected: true,
        message: None,
        version: Some(session.version().to_owned()),
        checks: NsxChecks {
            transport_zone,
            edge_cluster,
            t0_gateway,
        },
    })
}
