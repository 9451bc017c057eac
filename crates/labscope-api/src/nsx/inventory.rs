// NSX inventory operations
//
// Each check re-lists the full collection; nothing is cached between calls.

use crate::error::Error;
use crate::nsx::client::NsxSession;
use crate::nsx::models::{DisplayNamed, EdgeCluster, Tier0Gateway, TransportZone};

pub(crate) const TRANSPORT_ZONES_PATH: &str = "/api/v1/transport-zones";
pub(crate) const EDGE_CLUSTERS_PATH: &str = "/api/v1/edge-clusters";
pub(crate) const TIER0_PATH: &str = "/policy/api/v1/infra/tier-0s";

impl NsxSession {
    /// All transport zones, unfiltered.
    pub async fn transport_zones(&self) -> Result<Vec<TransportZone>, Error> {
        self.get_collection(TRANSPORT_ZONES_PATH).await
    }

    pub async fn edge_clusters(&self) -> Result<Vec<EdgeCluster>, Error> {
        self.get_collection(EDGE_CLUSTERS_PATH).await
    }

    pub async fn tier0_gateways(&self) -> Result<Vec<Tier0Gateway>, Error> {
        self.get_collection(TIER0_PATH).await
    }

    /// Overlay transport zone names, sorted. VLAN zones are skipped.
    pub async fn list_transport_zones(&self) -> Result<Vec<String>, Error> {
        let zones = self.transport_zones().await?;
        let overlay: Vec<&TransportZone> = zones.iter().filter(|z| z.is_overlay()).collect();
        Ok(sorted_display_names(overlay))
    }

    pub async fn list_edge_clusters(&self) -> Result<Vec<String>, Error> {
        Ok(sorted_display_names(&self.edge_clusters().await?))
    }

    pub async fn list_t0_gateways(&self) -> Result<Vec<String>, Error> {
        Ok(sorted_display_names(&self.tier0_gateways().await?))
    }

    pub async fn check_transport_zone(&self, name: &str) -> Result<bool, Error> {
        Ok(self.list_transport_zones().await?.iter().any(|z| z == name))
    }

    pub async fn check_edge_cluster(&self, name: &str) -> Result<bool, Error> {
        Ok(self.list_edge_clusters().await?.iter().any(|c| c == name))
    }

    pub async fn check_t0(&self, name: &str) -> Result<bool, Error> {
        Ok(self.list_t0_gateways().await?.iter().any(|g| g == name))
    }
}

fn sorted_display_names<I, T>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: std::ops::Deref,
    T::Target: DisplayNamed,
{
    let mut names: Vec<String> = items
        .into_iter()
        .map(|i| i.display_name().to_owned())
        .collect();
    names.sort();
    names
}
