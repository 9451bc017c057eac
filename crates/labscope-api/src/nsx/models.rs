// NSX-T response types
//
// Only the fields the inventory needs are modelled. Everything is
// `#[serde(default)]` because older managers omit fields freely.

use serde::{Deserialize, Serialize};

/// Standard NSX collection envelope:
/// ```json
/// { "results": [...], "result_count": 3 }
/// ```
#[derive(Debug, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub result_count: Option<u64>,
}

/// `GET /api/v1/node`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub product_version: Option<String>,
    #[serde(default)]
    pub node_version: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

impl NodeInfo {
    /// `product_version`, else `node_version`, else `"unknown"`.
    pub fn version(&self) -> String {
        [&self.product_version, &self.node_version]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| "unknown".into())
    }
}

/// Transport type of an overlay-backed zone.
pub const OVERLAY: &str = "OVERLAY";

/// `GET /api/v1/transport-zones`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportZone {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// `OVERLAY` or `VLAN`.
    #[serde(default)]
    pub transport_type: Option<String>,
}

impl TransportZone {
    pub fn is_overlay(&self) -> bool {
        self.transport_type.as_deref() == Some(OVERLAY)
    }
}

/// `GET /api/v1/edge-clusters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCluster {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub deployment_type: Option<String>,
}

/// `GET /policy/api/v1/infra/tier-0s`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tier0Gateway {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub ha_mode: Option<String>,
}

/// Anything listed by display name.
pub trait DisplayNamed {
    fn display_name(&self) -> &str;
}

impl DisplayNamed for TransportZone {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl DisplayNamed for EdgeCluster {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl DisplayNamed for Tier0Gateway {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}
