// vSphere inventory operations
//
// Each operation issues one or two property-collector queries and projects
// the parsed objects into inventory records. All of them are fail-soft: a
// rejected query yields an empty list, `false` or `{exists: false}`. Only
// transport failures are returned as errors.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::Error;
use crate::traversal::TraversalDef;
use crate::vsphere::client::VsphereSession;
use crate::vsphere::collector::PropertyQuery;
use crate::vsphere::models::{
    DATASTORE_CLUSTER_TYPE, DatastoreInfo, DatastoreListItem, ResourcePoolItem, ResourcePoolKind,
    VmFolderTreeItem,
};
use crate::xml::ParsedObject;

/// Root resource pool vSphere attaches to every cluster.
const IMPLICIT_ROOT_POOL: &str = "Resources";

/// Top-level VM folder every datacenter carries; hidden from the tree.
const DATACENTER_VM_FOLDER: &str = "vm";

const NAME_ONLY: &[&str] = &["name"];
const POD_PATHS: &[&str] = &["name", "summary.capacity", "summary.freeSpace"];
const DATASTORE_PATHS: &[&str] = &[
    "name",
    "summary.capacity",
    "summary.freeSpace",
    "summary.multipleHostAccess",
    "summary.type",
    "parent",
];
const FOLDER_PATHS: &[&str] = &["name", "parent"];

impl VsphereSession {
    // ── Datacenters ──────────────────────────────────────────────────

    /// Datacenter names, sorted.
    pub async fn list_datacenters(&self) -> Result<Vec<String>, Error> {
        let query = PropertyQuery::new("Datacenter", NAME_ONLY, vec![TraversalDef::folder()]);
        let objects = self.retrieve_properties(&query).await?;
        Ok(sorted_names(&objects))
    }

    pub async fn check_datacenter(&self, name: &str) -> Result<bool, Error> {
        Ok(self.list_datacenters().await?.iter().any(|dc| dc == name))
    }

    // ── Clusters & resource pools ────────────────────────────────────

    /// Clusters (sorted) followed by user-created resource pools (sorted).
    pub async fn list_resource_pools(&self) -> Result<Vec<ResourcePoolItem>, Error> {
        let cluster_query = PropertyQuery::new(
            "ComputeResource",
            NAME_ONLY,
            vec![TraversalDef::folder(), TraversalDef::datacenter_host()],
        );
        let pool_query = PropertyQuery::new(
            "ResourcePool",
            NAME_ONLY,
            vec![
                TraversalDef::folder(),
                TraversalDef::datacenter_host(),
                TraversalDef::compute_resource(),
                TraversalDef::resource_pool(),
            ],
        );

        let (clusters, pools) = tokio::try_join!(
            self.retrieve_properties(&cluster_query),
            self.retrieve_properties(&pool_query),
        )?;

        Ok(build_resource_pool_list(&clusters, &pools))
    }

    // ── Datastores ───────────────────────────────────────────────────

    /// Datastore clusters and shared standalone datastores.
    pub async fn list_datastores(&self) -> Result<Vec<DatastoreListItem>, Error> {
        let (pods, datastores) = self.query_storage().await?;
        Ok(build_datastore_list(&pods, &datastores))
    }

    /// Look up a datastore or datastore cluster by name.
    pub async fn check_datastore(&self, name: &str) -> Result<DatastoreInfo, Error> {
        let (pods, datastores) = self.query_storage().await?;
        Ok(find_datastore(name, &pods, &datastores))
    }

    async fn query_storage(&self) -> Result<(Vec<ParsedObject>, Vec<ParsedObject>), Error> {
        let traversals = vec![TraversalDef::folder(), TraversalDef::datacenter_datastore()];
        let pod_query = PropertyQuery::new("StoragePod", POD_PATHS, traversals.clone());
        let datastore_query = PropertyQuery::new("Datastore", DATASTORE_PATHS, traversals);

        tokio::try_join!(
            self.retrieve_properties(&pod_query),
            self.retrieve_properties(&datastore_query),
        )
    }

    // ── VM folders ───────────────────────────────────────────────────

    /// VM folder tree with each datacenter's `vm` folder hidden.
    pub async fn list_vm_folders(&self) -> Result<Vec<VmFolderTreeItem>, Error> {
        let folders = self.query_vm_folders().await?;
        Ok(build_vm_folder_tree(&folders))
    }

    /// Whether any VM folder has this name, wherever it sits in the tree.
    pub async fn check_vm_folder(&self, name: &str) -> Result<bool, Error> {
        let folders = self.query_vm_folders().await?;
        Ok(folders.iter().any(|f| f.name() == name))
    }

    async fn query_vm_folders(&self) -> Result<Vec<ParsedObject>, Error> {
        let query = PropertyQuery::new(
            "Folder",
            FOLDER_PATHS,
            vec![TraversalDef::folder(), TraversalDef::datacenter_vm()],
        );
        self.retrieve_properties(&query).await
    }
}

// ── Projections ──────────────────────────────────────────────────────

fn sorted_names(objects: &[ParsedObject]) -> Vec<String> {
    let mut names: Vec<String> = objects.iter().map(|o| o.name().to_owned()).collect();
    names.sort();
    names
}

fn bytes_prop(obj: &ParsedObject, path: &str) -> u64 {
    obj.prop(path)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

pub(crate) fn build_resource_pool_list(
    clusters: &[ParsedObject],
    pools: &[ParsedObject],
) -> Vec<ResourcePoolItem> {
    let clusters = sorted_names(clusters).into_iter().map(|name| ResourcePoolItem {
        name,
        kind: ResourcePoolKind::Cluster,
    });

    let pool_names: Vec<String> = sorted_names(pools)
        .into_iter()
        .filter(|name| name != IMPLICIT_ROOT_POOL)
        .collect();
    let pools = pool_names.into_iter().map(|name| ResourcePoolItem {
        name,
        kind: ResourcePoolKind::ResourcePool,
    });

    clusters.chain(pools).collect()
}

/// Storage pods plus every shared datastore that is not inside a pod.
///
/// Datastores in a pod are covered by the pod's aggregate figures and are
/// not listed on their own.
pub(crate) fn build_datastore_list(
    pods: &[ParsedObject],
    datastores: &[ParsedObject],
) -> Vec<DatastoreListItem> {
    let pod_refs: HashSet<&str> = pods.iter().map(|p| p.mo_ref.as_str()).collect();

    let mut items: Vec<DatastoreListItem> = pods
        .iter()
        .map(|pod| {
            DatastoreListItem::new(
                pod.name().to_owned(),
                DATASTORE_CLUSTER_TYPE.to_owned(),
                bytes_prop(pod, "summary.capacity"),
                bytes_prop(pod, "summary.freeSpace"),
            )
        })
        .collect();

    let standalone = datastores.iter().filter(|ds| {
        let shared = ds.prop("summary.multipleHostAccess") == Some("true");
        let in_pod = ds.prop("parent").is_some_and(|p| pod_refs.contains(p));
        shared && !in_pod
    });

    items.extend(standalone.map(|ds| {
        DatastoreListItem::new(
            ds.name().to_owned(),
            ds.prop("summary.type").unwrap_or_default().to_owned(),
            bytes_prop(ds, "summary.capacity"),
            bytes_prop(ds, "summary.freeSpace"),
        )
    }));

    items.sort_by(|a, b| a.ds_type.cmp(&b.ds_type).then_with(|| a.name.cmp(&b.name)));
    items
}

pub(crate) fn find_datastore(
    name: &str,
    pods: &[ParsedObject],
    datastores: &[ParsedObject],
) -> DatastoreInfo {
    datastores
        .iter()
        .chain(pods)
        .find(|o| o.name() == name)
        .map_or_else(DatastoreInfo::missing, |o| {
            DatastoreInfo::found(
                bytes_prop(o, "summary.capacity"),
                bytes_prop(o, "summary.freeSpace"),
            )
        })
}

struct FolderNode<'a> {
    name: &'a str,
    children: Vec<&'a str>,
}

/// Stitch a flat Folder list into a tree.
///
/// Roots are folders whose parent is not in the result set (the parent is a
/// Datacenter, which was not queried). A root named `vm` is replaced by its
/// children. Every level is sorted by name.
pub(crate) fn build_vm_folder_tree(folders: &[ParsedObject]) -> Vec<VmFolderTreeItem> {
    let mut nodes: HashMap<&str, FolderNode<'_>> = folders
        .iter()
        .map(|f| {
            (
                f.mo_ref.as_str(),
                FolderNode {
                    name: f.name(),
                    children: Vec::new(),
                },
            )
        })
        .collect();

    let mut roots = Vec::new();
    for folder in folders {
        match folder.prop("parent") {
            Some(parent) if parent != folder.mo_ref && nodes.contains_key(parent) => {
                if let Some(node) = nodes.get_mut(parent) {
                    node.children.push(folder.mo_ref.as_str());
                }
            }
            _ => roots.push(folder.mo_ref.as_str()),
        }
    }

    let mut tree = Vec::new();
    for root in roots {
        let Some(node) = nodes.get(root) else {
            continue;
        };
        if node.name == DATACENTER_VM_FOLDER {
            tree.extend(node.children.iter().filter_map(|c| build_subtree(c, &nodes)));
        } else if let Some(item) = build_subtree(root, &nodes) {
            tree.push(item);
        }
    }

    tree.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(roots = tree.len(), "built vm folder tree");
    tree
}

fn build_subtree(mo_ref: &str, nodes: &HashMap<&str, FolderNode<'_>>) -> Option<VmFolderTreeItem> {
    let node = nodes.get(mo_ref)?;
    let mut children: Vec<VmFolderTreeItem> = node
        .children
        .iter()
        .filter_map(|c| build_subtree(c, nodes))
        .collect();
    children.sort_by(|a, b| a.name.cmp(&b.name));
    Some(VmFolderTreeItem {
        name: node.name.to_owned(),
        children,
    })
}
