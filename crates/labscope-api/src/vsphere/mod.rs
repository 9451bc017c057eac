// vSphere (vCenter / ESXi) SOAP client
//
// Session establishment, the PropertyCollector query engine, and the
// inventory operations built on it. Everything funnels through
// `VsphereSession::retrieve_properties`.

pub mod auth;
pub mod client;
pub mod collector;
pub mod inventory;
pub mod models;

pub use auth::{ServiceContent, connect};
pub use client::{VsphereClient, VsphereSession};
pub use collector::PropertyQuery;
pub use models::{
    DatastoreInfo, DatastoreListItem, ManagedObjectRef, ResourcePoolItem, ResourcePoolKind,
    VmFolderTreeItem, bytes_to_gb,
};
