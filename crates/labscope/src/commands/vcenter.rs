//! vCenter command handlers.

use std::fmt::Write as _;
use std::future::Future;

use tabled::Tabled;
use tracing::warn;

use labscope_config::EndpointKind;
use labscope_core::{
    CoreError, DatastoreListItem, ResourcePoolItem, ResourcePoolKind, VcenterInventory,
    VcenterVerifyRequest, VcenterVerifyResponse, VmFolderTreeItem, VsphereSession,
};

use crate::cli::{GlobalOpts, VcenterArgs, VcenterCommand, VcenterVerifyArgs};
use crate::config::{self, ResolvedEndpoint};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct ResourcePoolRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: &'static str,
}

impl From<&ResourcePoolItem> for ResourcePoolRow {
    fn from(p: &ResourcePoolItem) -> Self {
        Self {
            name: p.name.clone(),
            kind: kind_label(p.kind),
        }
    }
}

fn kind_label(kind: ResourcePoolKind) -> &'static str {
    match kind {
        ResourcePoolKind::Cluster => "Cluster",
        ResourcePoolKind::ResourcePool => "Resource pool",
    }
}

#[derive(Tabled)]
struct DatastoreRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    ds_type: String,
    #[tabled(rename = "Capacity (GB)")]
    capacity: u64,
    #[tabled(rename = "Used (GB)")]
    used: u64,
    #[tabled(rename = "Free (GB)")]
    free: u64,
}

impl From<&DatastoreListItem> for DatastoreRow {
    fn from(d: &DatastoreListItem) -> Self {
        Self {
            name: d.name.clone(),
            ds_type: d.ds_type.clone(),
            capacity: d.capacity_gb,
            used: d.used_gb,
            free: d.free_gb,
        }
    }
}

// ── Detail views ────────────────────────────────────────────────────

/// Box-drawing tree of the VM folder hierarchy.
pub(crate) fn folder_tree(folders: &[VmFolderTreeItem]) -> String {
    fn walk(out: &mut String, items: &[VmFolderTreeItem], prefix: &str) {
        for (i, item) in items.iter().enumerate() {
            let last = i + 1 == items.len();
            let _ = writeln!(out, "{prefix}{}{}", if last { "└── " } else { "├── " }, item.name);
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            walk(out, &item.children, &child_prefix);
        }
    }

    let mut out = String::new();
    walk(&mut out, folders, "");
    out.trim_end().to_owned()
}

fn folder_paths(folders: &[VmFolderTreeItem]) -> Vec<String> {
    folders.iter().flat_map(VmFolderTreeItem::paths).collect()
}

fn inventory_detail(inv: &VcenterInventory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "vCenter:  {} ({})", inv.host, inv.version);
    let _ = writeln!(out, "Fetched:  {}", inv.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));

    let _ = writeln!(out, "\nDatacenters");
    for dc in &inv.datacenters {
        let _ = writeln!(out, "  {dc}");
    }

    let pools: Vec<ResourcePoolRow> = inv.resource_pools.iter().map(ResourcePoolRow::from).collect();
    let _ = writeln!(out, "\nResource pools\n{}", output::render_table(&pools));

    let stores: Vec<DatastoreRow> = inv.datastores.iter().map(DatastoreRow::from).collect();
    let _ = writeln!(out, "\nDatastores\n{}", output::render_table(&stores));

    let _ = write!(out, "\nVM folders\n{}", folder_tree(&inv.vm_folders));
    out
}

fn verify_detail(
    resp: &VcenterVerifyResponse,
    req: &VcenterVerifyRequest,
    color: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Host:        {}", req.hostname);
    if !resp.connected {
        let _ = write!(
            out,
            "Connected:   {}  {}",
            output::check_mark(false, color),
            resp.message.as_deref().unwrap_or_default()
        );
        return out;
    }
    let _ = write!(
        out,
        "Connected:   {}  vCenter {}",
        output::check_mark(true, color),
        resp.version.as_deref().unwrap_or("unknown")
    );

    let checks = &resp.checks;
    if let (Some(name), Some(found)) = (&req.datacenter, checks.datacenter) {
        let _ = write!(out, "\nDatacenter:  {}  {name}", output::check_mark(found, color));
    }
    if let (Some(name), Some(info)) = (&req.datastore, &checks.datastore) {
        let _ = write!(out, "\nDatastore:   {}  {name}", output::check_mark(info.exists, color));
        if let (Some(capacity), Some(used)) = (info.capacity_gb, info.used_gb) {
            let _ = write!(out, " ({used} of {capacity} GB used)");
        }
    }
    if let (Some(name), Some(found)) = (&req.vm_folder, checks.vm_folder) {
        let _ = write!(out, "\nVM folder:   {}  {name}", output::check_mark(found, color));
    }
    if let (Some(name), Some(found)) = (&req.resource_pool, checks.resource_pool) {
        let _ = write!(out, "\nResource:    {}  {name}", output::check_mark(found, color));
    }
    out
}

/// Requested checks that came back negative.
pub(crate) fn failed_checks(resp: &VcenterVerifyResponse) -> usize {
    let c = &resp.checks;
    [
        c.datacenter,
        c.datastore.as_ref().map(|d| d.exists),
        c.vm_folder,
        c.resource_pool,
    ]
    .into_iter()
    .filter(|outcome| *outcome == Some(false))
    .count()
}

// ── Session helper ──────────────────────────────────────────────────

/// Connect, run one query, log out. The whole exchange is under `--timeout`.
async fn query<T, E, F, Fut>(
    resolved: &ResolvedEndpoint,
    global: &GlobalOpts,
    what: &str,
    f: F,
) -> Result<T, CliError>
where
    F: FnOnce(VsphereSession) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    CoreError: From<E>,
{
    let host = &resolved.endpoint.host;
    tracing::debug!(%host, profile = ?resolved.profile, "vCenter endpoint resolved");
    let pb = util::spinner(format!("{what} on {host}"), global.quiet);
    let result = util::with_timeout(resolved.timeout, async {
        let session = resolved.endpoint.connect_vsphere().await?;
        let value = f(session.clone()).await;
        if let Err(e) = session.logout().await {
            warn!(%host, error = %e, "vCenter logout failed");
        }
        Ok::<_, CoreError>(value?)
    })
    .await;
    pb.finish_and_clear();
    result
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: VcenterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolve = || config::load_endpoint(global, EndpointKind::Vcenter);

    let out = match args.command {
        VcenterCommand::Verify(verify_args) => return verify(verify_args, global).await,

        VcenterCommand::Inventory => {
            let resolved = resolve()?;
            let pb = util::spinner(
                format!("Fetching inventory from {}", resolved.endpoint.host),
                global.quiet,
            );
            let inv = util::with_timeout(
                resolved.timeout,
                labscope_core::fetch_vcenter_inventory(&resolved.endpoint),
            )
            .await;
            pb.finish_and_clear();
            output::render_single(global.output, &inv?, inventory_detail, |i| i.host.clone())?
        }

        VcenterCommand::Datacenters => {
            let names = query(&resolve()?, global, "Listing datacenters", |s| async move {
                s.list_datacenters().await
            })
            .await?;
            output::render_list(
                global.output,
                &names,
                |n| NameRow { name: n.clone() },
                String::clone,
            )?
        }

        VcenterCommand::ResourcePools => {
            let pools = query(&resolve()?, global, "Listing resource pools", |s| async move {
                s.list_resource_pools().await
            })
            .await?;
            output::render_list(
                global.output,
                &pools,
                |p| ResourcePoolRow::from(p),
                |p| p.name.clone(),
            )?
        }

        VcenterCommand::Datastores => {
            let stores = query(&resolve()?, global, "Listing datastores", |s| async move {
                s.list_datastores().await
            })
            .await?;
            output::render_list(
                global.output,
                &stores,
                |d| DatastoreRow::from(d),
                |d| d.name.clone(),
            )?
        }

        VcenterCommand::Folders => {
            let folders = query(&resolve()?, global, "Listing VM folders", |s| async move {
                s.list_vm_folders().await
            })
            .await?;
            output::render_single(
                global.output,
                &folders,
                |f| folder_tree(f),
                |f| folder_paths(f).join("\n"),
            )?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

async fn verify(args: VcenterVerifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (req, tls, timeout) = match args.from_file {
        Some(ref path) => {
            let req = VcenterVerifyRequest::from_json(&util::read_request_file(path)?)?;
            (req, config::flag_tls(global).unwrap_or_default(), global.timeout)
        }
        None => {
            let resolved = config::load_endpoint(global, EndpointKind::Vcenter)?;
            let req = VcenterVerifyRequest {
                hostname: resolved.endpoint.host.clone(),
                username: resolved.endpoint.username.clone(),
                password: resolved.endpoint.password.clone(),
                datacenter: args.datacenter,
                datastore: args.datastore,
                vm_folder: args.vm_folder,
                resource_pool: args.resource_pool,
            };
            (req, resolved.endpoint.tls, resolved.timeout)
        }
    };

    let transport = labscope_core::EndpointConfig::new(
        req.hostname.clone(),
        req.username.clone(),
        req.password.clone(),
    )
    .with_tls(tls)
    .transport();

    let pb = util::spinner(format!("Verifying {}", req.hostname), global.quiet);
    let resp = util::with_timeout(timeout, labscope_core::verify_vcenter(&req, &transport)).await;
    pb.finish_and_clear();
    let resp = resp?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &resp,
        |r| verify_detail(r, &req, color),
        |r| if r.connected { "connected".into() } else { "disconnected".into() },
    )?;
    output::print_output(&out, global.quiet);

    if !resp.connected {
        return Err(CliError::NotConnected {
            host: req.hostname,
            reason: resp.message.unwrap_or_default(),
        });
    }
    match failed_checks(&resp) {
        0 => Ok(()),
        failed => Err(CliError::ChecksFailed { failed }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use labscope_core::{DatastoreInfo, VcenterChecks};

    use super::*;

    fn tree() -> Vec<VmFolderTreeItem> {
        vec![
            VmFolderTreeItem::leaf("Dev"),
            VmFolderTreeItem {
                name: "Prod".into(),
                children: vec![VmFolderTreeItem::leaf("db"), VmFolderTreeItem::leaf("web")],
            },
        ]
    }

    #[test]
    fn folder_tree_draws_nested_branches() {
        assert_eq!(
            folder_tree(&tree()),
            "├── Dev\n└── Prod\n    ├── db\n    └── web"
        );
    }

    #[test]
    fn folder_paths_are_depth_first() {
        assert_eq!(folder_paths(&tree()), vec!["Dev", "Prod", "Prod/db", "Prod/web"]);
    }

    #[test]
    fn failed_checks_ignores_unrequested() {
        let resp = VcenterVerifyResponse {
            connected: true,
            message: None,
            version: Some("8.0.2".into()),
            checks: VcenterChecks {
                datacenter: Some(true),
                datastore: Some(DatastoreInfo::missing()),
                vm_folder: None,
                resource_pool: Some(false),
            },
        };
        assert_eq!(failed_checks(&resp), 2);
    }
}
