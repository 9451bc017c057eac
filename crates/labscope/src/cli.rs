//! Clap derive structures for the `labscope` CLI.
//!
//! Depends only on `clap` and `clap_complete` so that `build.rs` can compile
//! it standalone for man page generation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-level CLI ────────────────────────────────────────────────────

/// labscope: discover and verify vCenter and NSX-T lab inventory
#[derive(Debug, Parser)]
#[command(
    name = "labscope",
    version,
    about = "Discover and verify vCenter and NSX-T lab inventory",
    long_about = "Connects to a vCenter Server (vSphere SOAP API) or an NSX-T manager \
        (REST API) and lists datacenters, resource pools, datastores, VM folders, \
        transport zones, edge clusters and tier-0 gateways.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Endpoint profile to use
    #[arg(long, short = 'p', env = "LABSCOPE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// vCenter or NSX manager hostname or URL (overrides profile)
    #[arg(long, short = 'H', env = "LABSCOPE_HOST", global = true)]
    pub host: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "LABSCOPE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password (overrides profile and keyring)
    #[arg(long, env = "LABSCOPE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LABSCOPE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid or self-signed TLS certificates
    #[arg(long, short = 'k', global = true, conflicts_with = "ca_cert")]
    pub insecure: bool,

    /// Verify TLS against this CA bundle (PEM)
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Overall operation timeout in seconds
    #[arg(long, env = "LABSCOPE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Top-level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query a vCenter Server
    #[command(alias = "vc")]
    Vcenter(VcenterArgs),

    /// Query an NSX-T manager
    Nsx(NsxArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── vCenter ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct VcenterArgs {
    #[command(subcommand)]
    pub command: VcenterCommand,
}

#[derive(Debug, Subcommand)]
pub enum VcenterCommand {
    /// Connect and check that the named objects exist
    Verify(VcenterVerifyArgs),

    /// Fetch datacenters, resource pools, datastores and VM folders at once
    Inventory,

    /// List datacenter names
    #[command(alias = "dc")]
    Datacenters,

    /// List clusters and standalone hosts
    #[command(alias = "pools")]
    ResourcePools,

    /// List datastores and datastore clusters with capacity
    #[command(alias = "ds")]
    Datastores,

    /// Show the VM folder tree
    Folders,
}

#[derive(Debug, Args)]
pub struct VcenterVerifyArgs {
    /// Datacenter that must exist
    #[arg(long)]
    pub datacenter: Option<String>,

    /// Datastore that must exist (capacity is reported)
    #[arg(long)]
    pub datastore: Option<String>,

    /// VM folder that must exist
    #[arg(long)]
    pub vm_folder: Option<String>,

    /// Cluster or standalone host that must exist
    #[arg(long)]
    pub resource_pool: Option<String>,

    /// Read the whole request (hostname, credentials, names) from a JSON file, `-` for stdin
    #[arg(
        long,
        short = 'F',
        conflicts_with_all = ["datacenter", "datastore", "vm_folder", "resource_pool"]
    )]
    pub from_file: Option<PathBuf>,
}

// ── NSX ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NsxArgs {
    #[command(subcommand)]
    pub command: NsxCommand,
}

#[derive(Debug, Subcommand)]
pub enum NsxCommand {
    /// Connect and check that the named objects exist
    Verify(NsxVerifyArgs),

    /// Fetch transport zones, edge clusters and tier-0 gateways at once
    Inventory,

    /// List overlay transport zone names
    #[command(alias = "tz")]
    TransportZones,

    /// List edge cluster names
    EdgeClusters,

    /// List tier-0 gateway names
    #[command(alias = "t0")]
    T0Gateways,
}

#[derive(Debug, Args)]
pub struct NsxVerifyArgs {
    /// Overlay transport zone that must exist
    #[arg(long)]
    pub transport_zone: Option<String>,

    /// Edge cluster that must exist
    #[arg(long)]
    pub edge_cluster: Option<String>,

    /// Tier-0 gateway that must exist
    #[arg(long)]
    pub t0_gateway: Option<String>,

    /// Read the whole request (hostname, credentials, names) from a JSON file, `-` for stdin
    #[arg(
        long,
        short = 'F',
        conflicts_with_all = ["transport_zone", "edge_cluster", "t0_gateway"]
    )]
    pub from_file: Option<PathBuf>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the resolved configuration (passwords redacted)
    Show,

    /// Print the config file path
    Path,

    /// List profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile to update (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
