// vSphere inventory records
//
// Derived from property-collector results on every call; nothing here is
// cached or has a lifecycle of its own.

use serde::{Deserialize, Serialize};

const GIB: u64 = 1 << 30;

/// Convert bytes to whole gigabytes, rounding half up.
pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / GIB + u64::from(bytes % GIB >= GIB / 2)
}

/// A managed object reference as it appears on the wire:
/// `<_this type="PropertyCollector">propertyCollector</_this>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    #[serde(rename = "type")]
    pub mo_type: String,
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(mo_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            mo_type: mo_type.into(),
            value: value.into(),
        }
    }
}

/// Result of a datastore existence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreInfo {
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_gb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_gb: Option<u64>,
}

impl DatastoreInfo {
    pub fn missing() -> Self {
        Self {
            exists: false,
            capacity_gb: None,
            used_gb: None,
        }
    }

    pub fn found(capacity_bytes: u64, free_bytes: u64) -> Self {
        Self {
            exists: true,
            capacity_gb: Some(bytes_to_gb(capacity_bytes)),
            used_gb: Some(bytes_to_gb(capacity_bytes.saturating_sub(free_bytes))),
        }
    }
}

/// Whether a placement target is a cluster or a user-created resource pool.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourcePoolKind {
    Cluster,
    ResourcePool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePoolItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ResourcePoolKind,
}

/// Type label used for storage pods in datastore listings.
pub const DATASTORE_CLUSTER_TYPE: &str = "Datastore Cluster";

/// A datastore or datastore cluster with capacity figures in GB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastoreListItem {
    pub name: String,
    /// `Datastore Cluster` for storage pods, otherwise `summary.type`
    /// (VMFS, NFS, vsan, ...).
    #[serde(rename = "type")]
    pub ds_type: String,
    pub capacity_gb: u64,
    pub used_gb: u64,
    pub free_gb: u64,
}

impl DatastoreListItem {
    pub fn new(name: String, ds_type: String, capacity_bytes: u64, free_bytes: u64) -> Self {
        Self {
            name,
            ds_type,
            capacity_gb: bytes_to_gb(capacity_bytes),
            used_gb: bytes_to_gb(capacity_bytes.saturating_sub(free_bytes)),
            free_gb: bytes_to_gb(free_bytes),
        }
    }
}

/// A VM folder and its subfolders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmFolderTreeItem {
    pub name: String,
    #[serde(default)]
    pub children: Vec<VmFolderTreeItem>,
}

impl VmFolderTreeItem {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Folder paths (`Prod/Web`) of this node and all descendants, depth first.
    pub fn paths(&self) -> Vec<String> {
        let mut out = vec![self.name.clone()];
        for child in &self.children {
            out.extend(
                child
                    .paths()
                    .into_iter()
                    .map(|p| format!("{}/{p}", self.name)),
            );
        }
        out
    }
}
