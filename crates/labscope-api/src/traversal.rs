// PropertyCollector traversal specs
//
// A query starts at the root Folder and only reaches objects through the
// traversal specs it carries. The six definitions here cover every object
// type this crate lists, at any datacenter/folder nesting depth, provided
// `traverseFolder` follows whatever datacenter or compute-resource hop the
// query adds (see `merge_folder_traversal`).

use std::fmt::Write as _;

use quick_xml::escape::escape;

pub const TRAVERSE_FOLDER: &str = "traverseFolder";
pub const TRAVERSE_DATACENTER_HOST: &str = "traverseDatacenterHost";
pub const TRAVERSE_DATACENTER_DATASTORE: &str = "traverseDatacenterDatastore";
pub const TRAVERSE_DATACENTER_VM: &str = "traverseDatacenterVm";
pub const TRAVERSE_COMPUTE_RESOURCE: &str = "traverseComputeResource";
pub const TRAVERSE_RESOURCE_POOL: &str = "traverseResourcePool";

/// One traversal rule: from `source_type`, follow `path`, then recurse into
/// the traversals named in `follow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalDef {
    pub name: &'static str,
    pub source_type: &'static str,
    pub path: &'static str,
    pub follow: Vec<&'static str>,
}

impl TraversalDef {
    /// Folder → `childEntity`, recursing into nested folders.
    pub fn folder() -> Self {
        Self {
            name: TRAVERSE_FOLDER,
            source_type: "Folder",
            path: "childEntity",
            follow: vec![TRAVERSE_FOLDER],
        }
    }

    /// Datacenter → `hostFolder` (clusters and standalone hosts).
    pub fn datacenter_host() -> Self {
        Self {
            name: TRAVERSE_DATACENTER_HOST,
            source_type: "Datacenter",
            path: "hostFolder",
            follow: vec![TRAVERSE_FOLDER],
        }
    }

    /// Datacenter → `datastoreFolder` (datastores and storage pods).
    pub fn datacenter_datastore() -> Self {
        Self {
            name: TRAVERSE_DATACENTER_DATASTORE,
            source_type: "Datacenter",
            path: "datastoreFolder",
            follow: vec![TRAVERSE_FOLDER],
        }
    }

    /// Datacenter → `vmFolder` (the VM and template folder tree).
    pub fn datacenter_vm() -> Self {
        Self {
            name: TRAVERSE_DATACENTER_VM,
            source_type: "Datacenter",
            path: "vmFolder",
            follow: vec![TRAVERSE_FOLDER],
        }
    }

    /// ComputeResource → its root `resourcePool`.
    pub fn compute_resource() -> Self {
        Self {
            name: TRAVERSE_COMPUTE_RESOURCE,
            source_type: "ComputeResource",
            path: "resourcePool",
            follow: vec![TRAVERSE_RESOURCE_POOL],
        }
    }

    /// ResourcePool → child `resourcePool`s, recursively.
    pub fn resource_pool() -> Self {
        Self {
            name: TRAVERSE_RESOURCE_POOL,
            source_type: "ResourcePool",
            path: "resourcePool",
            follow: vec![TRAVERSE_RESOURCE_POOL],
        }
    }
}

/// Make `traverseFolder` follow every other traversal in the set.
///
/// Without this, a datacenter nested inside a folder is never expanded and
/// the query only sees one folder level. Names already followed are not
/// added twice, so applying the merge repeatedly is a no-op.
pub fn merge_folder_traversal(defs: &[TraversalDef]) -> Vec<TraversalDef> {
    let mut merged = defs.to_vec();
    if merged.len() < 2 {
        return merged;
    }

    let others: Vec<&'static str> = merged
        .iter()
        .map(|d| d.name)
        .filter(|name| *name != TRAVERSE_FOLDER)
        .collect();

    if let Some(folder) = merged.iter_mut().find(|d| d.name == TRAVERSE_FOLDER) {
        for name in others {
            if !folder.follow.contains(&name) {
                folder.follow.push(name);
            }
        }
    }

    merged
}

/// Render the `<selectSet>` elements for an object spec.
pub fn build_select_set(defs: &[TraversalDef]) -> String {
    let mut xml = String::new();
    for def in defs {
        let _ = write!(
            xml,
            r#"<selectSet xsi:type="TraversalSpec"><name>{}</name><type>{}</type><path>{}</path><skip>false</skip>"#,
            escape(def.name),
            escape(def.source_type),
            escape(def.path),
        );
        for follow in &def.follow {
            let _ = write!(xml, "<selectSet><name>{}</name></selectSet>", escape(*follow));
        }
        xml.push_str("</selectSet>");
    }
    xml
}
