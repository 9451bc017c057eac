// NSX-T REST client
//
// No traversal engine here: the NSX manager returns flat collections
// directly. The session is just cached credentials, each request carries
// Basic auth again.

pub mod client;
pub mod inventory;
pub mod models;

pub use client::{NsxClient, NsxSession, connect};
pub use models::{EdgeCluster, ListResult, NodeInfo, Tier0Gateway, TransportZone};
