// ── Full inventory fetch ──
//
// Connect once, fan out every list operation, join. The first hard failure
// aborts the whole fetch; fail-soft empties from individual queries do not.

use chrono::{DateTime, Utc};
use labscope_api::{DatastoreListItem, ResourcePoolItem, VmFolderTreeItem};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EndpointConfig;
use crate::error::CoreError;

/// Everything discoverable on a vCenter.
#[derive(Debug, Clone, Serialize)]
pub struct VcenterInventory {
    pub host: String,
    pub version: String,
    pub datacenters: Vec<String>,
    pub resource_pools: Vec<ResourcePoolItem>,
    pub datastores: Vec<DatastoreListItem>,
    pub vm_folders: Vec<VmFolderTreeItem>,
    pub fetched_at: DateTime<Utc>,
}

/// Everything discoverable on an NSX manager.
#[derive(Debug, Clone, Serialize)]
pub struct NsxInventory {
    pub host: String,
    pub version: String,
    pub transport_zones: Vec<String>,
    pub edge_clusters: Vec<String>,
    pub t0_gateways: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

pub async fn fetch_vcenter_inventory(config: &EndpointConfig) -> Result<VcenterInventory, CoreError> {
    let session = config.connect_vsphere().await?;

    let fetched = tokio::try_join!(
        session.list_datacenters(),
        session.list_resource_pools(),
        session.list_datastores(),
        session.list_vm_folders(),
    );

    // Logout runs on the error path too.
    if let Err(e) = session.logout().await {
        warn!(host = %config.host, error = %e, "vCenter logout failed");
    }
    let (datacenters, resource_pools, datastores, vm_folders) = fetched?;

    debug!(
        host = %config.host,
        datacenters = datacenters.len(),
        resource_pools = resource_pools.len(),
        datastores = datastores.len(),
        vm_folders = vm_folders.len(),
        "vCenter inventory fetched"
    );

    Ok(VcenterInventory {
        host: config.host.clone(),
        version: session.version().to_owned(),
        datacenters,
        resource_pools,
        datastores,
        vm_folders,
        fetched_at: Utc::now(),
    })
}

pub async fn fetch_nsx_inventory(config: &EndpointConfig) -> Result<NsxInventory, CoreError> {
    let session = config.connect_nsx().await?;

    let (transport_zones, edge_clusters, t0_gateways) = tokio::try_join!(
        session.list_transport_zones(),
        session.list_edge_clusters(),
        session.list_t0_gateways(),
    )?;

    debug!(
        host = %config.host,
        transport_zones = transport_zones.len(),
        edge_clusters = edge_clusters.len(),
        t0_gateways = t0_gateways.len(),
        "NSX inventory fetched"
    );

    Ok(NsxInventory {
        host: config.host.clone(),
        version: session.version().to_owned(),
        transport_zones,
        edge_clusters,
        t0_gateways,
        fetched_at: Utc::now(),
    })
}
