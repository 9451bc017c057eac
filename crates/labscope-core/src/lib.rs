// labscope-core: Verification and inventory handlers between labscope-api and consumers.

pub mod config;
pub mod error;
pub mod inventory;
pub mod verify;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EndpointConfig, TlsVerification};
pub use error::CoreError;
pub use inventory::{NsxInventory, VcenterInventory, fetch_nsx_inventory, fetch_vcenter_inventory};
pub use verify::{
    NsxChecks, NsxVerifyRequest, NsxVerifyResponse, VcenterChecks, VcenterVerifyRequest,
    VcenterVerifyResponse, verify_nsx, verify_vcenter,
};

// Re-export record types consumers render directly.
pub use labscope_api::{
    DatastoreInfo, DatastoreListItem, NsxSession, ResourcePoolItem, ResourcePoolKind,
    TransportConfig, VmFolderTreeItem, VsphereSession,
};
