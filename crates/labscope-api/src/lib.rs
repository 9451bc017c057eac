// labscope-api: Async Rust client for lab virtualization endpoints (vSphere SOAP + NSX-T REST)

pub mod error;
pub mod nsx;
pub mod rest;
pub mod soap;
pub mod transport;
pub mod traversal;
pub mod vsphere;
pub mod xml;

pub use error::Error;
pub use nsx::{EdgeCluster, NsxClient, NsxSession, Tier0Gateway, TransportZone};
pub use rest::{RestClient, RestResponse};
pub use soap::{SoapClient, SoapResponse};
pub use transport::{TlsMode, TransportConfig};
pub use traversal::TraversalDef;
pub use vsphere::{
    DatastoreInfo, DatastoreListItem, ManagedObjectRef, PropertyQuery, ResourcePoolItem,
    ResourcePoolKind, ServiceContent, VmFolderTreeItem, VsphereClient, VsphereSession,
};
pub use xml::ParsedObject;
