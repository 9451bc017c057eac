//! NSX command handlers.

use std::fmt::Write as _;
use std::future::Future;

use tabled::Tabled;

use labscope_config::EndpointKind;
use labscope_core::{CoreError, NsxInventory, NsxSession, NsxVerifyRequest, NsxVerifyResponse};

use crate::cli::{GlobalOpts, NsxArgs, NsxCommand, NsxVerifyArgs};
use crate::config::{self, ResolvedEndpoint};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NameRow {
    #[tabled(rename = "Name")]
    name: String,
}

fn render_names(global: &GlobalOpts, names: &[String]) -> Result<String, CliError> {
    output::render_list(
        global.output,
        names,
        |n| NameRow { name: n.clone() },
        String::clone,
    )
}

// ── Detail views ────────────────────────────────────────────────────

fn inventory_detail(inv: &NsxInventory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "NSX:      {} ({})", inv.host, inv.version);
    let _ = write!(out, "Fetched:  {}", inv.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));

    for (title, names) in [
        ("Transport zones (overlay)", &inv.transport_zones),
        ("Edge clusters", &inv.edge_clusters),
        ("Tier-0 gateways", &inv.t0_gateways),
    ] {
        let _ = write!(out, "\n\n{title}");
        if names.is_empty() {
            let _ = write!(out, "\n  (none)");
        }
        for name in names {
            let _ = write!(out, "\n  {name}");
        }
    }
    out
}

fn verify_detail(resp: &NsxVerifyResponse, req: &NsxVerifyRequest, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Host:            {}", req.hostname);
    if !resp.connected {
        let _ = write!(
            out,
            "Connected:       {}  {}",
            output::check_mark(false, color),
            resp.message.as_deref().unwrap_or_default()
        );
        return out;
    }
    let _ = write!(
        out,
        "Connected:       {}  NSX {}",
        output::check_mark(true, color),
        resp.version.as_deref().unwrap_or("unknown")
    );

    let checks = &resp.checks;
    for (label, name, outcome) in [
        ("Transport zone:", &req.transport_zone, checks.transport_zone),
        ("Edge cluster:", &req.edge_cluster, checks.edge_cluster),
        ("Tier-0 gateway:", &req.t0_gateway, checks.t0_gateway),
    ] {
        if let (Some(name), Some(found)) = (name, outcome) {
            let _ = write!(out, "\n{label:<16} {}  {name}", output::check_mark(found, color));
        }
    }
    out
}

pub(crate) fn failed_checks(resp: &NsxVerifyResponse) -> usize {
    let c = &resp.checks;
    [c.transport_zone, c.edge_cluster, c.t0_gateway]
        .into_iter()
        .filter(|outcome| *outcome == Some(false))
        .count()
}

// ── Session helper ──────────────────────────────────────────────────

/// Connect and run one query under `--timeout`.
async fn query<T, E, F, Fut>(
    resolved: &ResolvedEndpoint,
    global: &GlobalOpts,
    what: &str,
    f: F,
) -> Result<T, CliError>
where
    F: FnOnce(NsxSession) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    CoreError: From<E>,
{
    let host = &resolved.endpoint.host;
    tracing::debug!(%host, profile = ?resolved.profile, "NSX endpoint resolved");
    let pb = util::spinner(format!("{what} on {host}"), global.quiet);
    let result = util::with_timeout(resolved.timeout, async {
        let session = resolved.endpoint.connect_nsx().await?;
        Ok::<_, CoreError>(f(session).await?)
    })
    .await;
    pb.finish_and_clear();
    result
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: NsxArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolve = || config::load_endpoint(global, EndpointKind::Nsx);

    let out = match args.command {
        NsxCommand::Verify(verify_args) => return verify(verify_args, global).await,

        NsxCommand::Inventory => {
            let resolved = resolve()?;
            let pb = util::spinner(
                format!("Fetching inventory from {}", resolved.endpoint.host),
                global.quiet,
            );
            let inv = util::with_timeout(
                resolved.timeout,
                labscope_core::fetch_nsx_inventory(&resolved.endpoint),
            )
            .await;
            pb.finish_and_clear();
            output::render_single(global.output, &inv?, inventory_detail, |i| i.host.clone())?
        }

        NsxCommand::TransportZones => {
            let names = query(&resolve()?, global, "Listing transport zones", |s| async move {
                s.list_transport_zones().await
            })
            .await?;
            render_names(global, &names)?
        }

        NsxCommand::EdgeClusters => {
            let names = query(&resolve()?, global, "Listing edge clusters", |s| async move {
                s.list_edge_clusters().await
            })
            .await?;
            render_names(global, &names)?
        }

        NsxCommand::T0Gateways => {
            let names = query(&resolve()?, global, "Listing tier-0 gateways", |s| async move {
                s.list_t0_gateways().await
            })
            .await?;
            render_names(global, &names)?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

async fn verify(args: NsxVerifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (req, tls, timeout) = match args.from_file {
        Some(ref path) => {
            let req = NsxVerifyRequest::from_json(&util::read_request_file(path)?)?;
            (req, config::flag_tls(global).unwrap_or_default(), global.timeout)
        }
        None => {
            let resolved = config::load_endpoint(global, EndpointKind::Nsx)?;
            let req = NsxVerifyRequest {
                hostname: resolved.endpoint.host.clone(),
                username: resolved.endpoint.username.clone(),
                password: resolved.endpoint.password.clone(),
                transport_zone: args.transport_zone,
                edge_cluster: args.edge_cluster,
                t0_gateway: args.t0_gateway,
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
    let resp = util::with_timeout(timeout, labscope_core::verify_nsx(&req, &transport)).await;
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
