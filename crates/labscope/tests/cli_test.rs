//! Integration tests for the `labscope` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without any endpoint; NSX commands run against a wiremock manager.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NONEXISTENT_HOME: &str = "/tmp/labscope-cli-test-nonexistent";

/// Build a command for the `labscope` binary with env isolation.
///
/// Clears all `LABSCOPE_*` env vars and points config directories at
/// `config_home` so tests never touch the user's real configuration.
fn labscope_in(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("labscope");
    cmd.env("HOME", config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("LABSCOPE_PROFILE")
        .env_remove("LABSCOPE_HOST")
        .env_remove("LABSCOPE_USERNAME")
        .env_remove("LABSCOPE_PASSWORD")
        .env_remove("LABSCOPE_OUTPUT")
        .env_remove("LABSCOPE_TIMEOUT")
        .env_remove("LABSCOPE_DEBUG_REST")
        .env_remove("LABSCOPE_DEBUG_SOAP")
        .write_stdin("");
    cmd
}

fn labscope() -> assert_cmd::Command {
    labscope_in(Path::new(NONEXISTENT_HOME))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Write `contents` as the labscope config under `config_home`.
fn write_config(config_home: &Path, contents: &str) -> std::path::PathBuf {
    let dir = config_home.join("labscope");
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("config.toml");
    std::fs::write(&file, contents).unwrap();
    file
}

/// Run a prepared command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn nsx_manager() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/node"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "product_version": "4.1.2.0.0" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transport-zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "z3", "display_name": "Z3", "transport_type": "VLAN" },
                { "id": "z2", "display_name": "Z2", "transport_type": "OVERLAY" },
                { "id": "z1", "display_name": "Z1", "transport_type": "OVERLAY" }
            ],
            "result_count": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/edge-clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "ec1", "display_name": "edge-cluster-01" }],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/policy/api/v1/infra/tier-0s"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": "t0", "display_name": "T0-lab", "ha_mode": "ACTIVE_STANDBY" }],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    server
}

fn nsx_cmd(server: &MockServer, args: &[&str]) -> assert_cmd::Command {
    let mut cmd = labscope();
    cmd.args(args)
        .args(["--host", &server.uri(), "-u", "admin", "--password", "VMware1!VMware1!"]);
    cmd
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = labscope().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    labscope().arg("--help").assert().success().stdout(
        predicate::str::contains("vCenter")
            .and(predicate::str::contains("vcenter"))
            .and(predicate::str::contains("nsx"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    labscope()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("labscope"));
}

#[test]
fn test_invalid_subcommand() {
    labscope().arg("esxi").assert().failure().code(2);
}

#[test]
fn test_vcenter_subcommands_listed() {
    labscope().args(["vcenter", "--help"]).assert().success().stdout(
        predicate::str::contains("verify")
            .and(predicate::str::contains("resource-pools"))
            .and(predicate::str::contains("datastores"))
            .and(predicate::str::contains("folders")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    labscope()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("labscope"));
}

#[test]
fn test_completions_zsh() {
    labscope()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_fish() {
    labscope()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Missing configuration ───────────────────────────────────────────

#[test]
fn test_vcenter_without_host_or_profile() {
    let output = labscope().args(["vcenter", "datacenters"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("No vcenter endpoint configured"),
        "Expected missing-endpoint error:\n{text}"
    );
}

#[test]
fn test_missing_password_without_terminal() {
    let output = labscope()
        .args(["nsx", "transport-zones", "--host", "nsx.lab", "-u", "admin"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("No credentials configured"));
}

#[test]
fn test_unknown_profile() {
    let output = labscope()
        .args(["-p", "prod", "nsx", "edge-clusters"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("Profile 'prod' not found"));
}

#[test]
fn test_unreachable_vcenter_is_connection_error() {
    let output = labscope()
        .args([
            "vcenter",
            "datacenters",
            "--host",
            "http://127.0.0.1:1",
            "-u",
            "administrator@vsphere.local",
            "--password",
            "pw",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_follows_xdg() {
    let home = tempfile::tempdir().unwrap();
    labscope_in(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("labscope/config.toml"));
}

const LAB_CONFIG: &str = r#"
default_profile = "vc"

[profiles.vc]
kind = "vcenter"
host = "vc.lab"
username = "administrator@vsphere.local"
password = "VMware1!"

[profiles.nsx]
kind = "nsx"
host = "nsx.lab"
username = "admin"
"#;

#[test]
fn test_config_profiles_plain() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    labscope_in(home.path())
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout("nsx\nvc\n");
}

#[test]
fn test_config_show_masks_password() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    let output = labscope_in(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["default_profile"], "vc");
    assert_eq!(value["profiles"]["vc"]["password"], "****");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("VMware1!"));
}

#[test]
fn test_config_use_switches_default() {
    let home = tempfile::tempdir().unwrap();
    let file = write_config(home.path(), LAB_CONFIG);
    labscope_in(home.path())
        .args(["config", "use", "nsx"])
        .assert()
        .success();
    let saved = std::fs::read_to_string(file).unwrap();
    assert!(saved.contains("default_profile = \"nsx\""), "saved config:\n{saved}");
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    let output = labscope_in(home.path())
        .args(["config", "use", "prod"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("nsx, vc"));
}

#[test]
fn test_profile_of_wrong_kind_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), LAB_CONFIG);
    let output = labscope_in(home.path())
        .args(["-p", "vc", "nsx", "transport-zones"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── NSX against a mock manager ──────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_transport_zones_plain() {
    let server = nsx_manager().await;
    let output = run(nsx_cmd(&server, &["nsx", "transport-zones", "-o", "plain"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Z1\nZ2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_inventory_json() {
    let server = nsx_manager().await;
    let output = run(nsx_cmd(&server, &["nsx", "inventory", "-o", "json"])).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let inv: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(inv["version"], "4.1.2.0.0");
    assert_eq!(inv["transport_zones"], json!(["Z1", "Z2"]));
    assert_eq!(inv["edge_clusters"], json!(["edge-cluster-01"]));
    assert_eq!(inv["t0_gateways"], json!(["T0-lab"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_verify_all_checks_pass() {
    let server = nsx_manager().await;
    let output = run(nsx_cmd(
        &server,
        &[
            "nsx",
            "verify",
            "--transport-zone",
            "Z1",
            "--edge-cluster",
            "edge-cluster-01",
            "--t0-gateway",
            "T0-lab",
            "-o",
            "json-compact",
        ],
    ))
    .await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        resp,
        json!({
            "connected": true,
            "version": "4.1.2.0.0",
            "checks": { "transportZone": true, "edgeCluster": true, "t0Gateway": true }
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_verify_vlan_zone_fails_check() {
    let server = nsx_manager().await;
    let output = run(nsx_cmd(
        &server,
        &["nsx", "verify", "--transport-zone", "Z3", "-o", "json"],
    ))
    .await;
    assert_eq!(output.status.code(), Some(1));
    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resp["checks"]["transportZone"], false);
    assert!(combined_output(&output).contains("1 verification check(s) failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_verify_bad_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/node"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let output = run(nsx_cmd(&server, &["nsx", "verify", "-o", "json"])).await;
    assert_eq!(output.status.code(), Some(7));
    let resp: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(resp["connected"], false);
    assert_eq!(resp["message"], "Invalid credentials");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_verify_from_file() {
    let server = nsx_manager().await;
    let dir = tempfile::tempdir().unwrap();
    let request = dir.path().join("request.json");
    std::fs::write(
        &request,
        json!({
            "hostname": server.uri(),
            "username": "admin",
            "password": "VMware1!VMware1!",
            "t0Gateway": "T0-lab"
        })
        .to_string(),
    )
    .unwrap();

    let mut cmd = labscope();
    cmd.args(["nsx", "verify", "-o", "plain", "--from-file"])
        .arg(&request);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "connected\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nsx_profile_from_config_file() {
    let server = nsx_manager().await;
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        &format!(
            "default_profile = \"lab\"\n\n[profiles.lab]\nkind = \"nsx\"\nhost = \"{}\"\n\
             username = \"admin\"\npassword = \"VMware1!VMware1!\"\n",
            server.uri()
        ),
    );

    let mut cmd = labscope_in(home.path());
    cmd.args(["nsx", "edge-clusters", "-o", "plain"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "edge-cluster-01\n");
}

// ── vCenter against a mock server ───────────────────────────────────

fn soap(inner: &str) -> String {
    format!(
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
            "<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        inner
    )
}

/// A vCenter that accepts login and logout but breaks the Datacenter query.
async fn broken_vcenter() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveServiceContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap(concat!(
            "<RetrieveServiceContentResponse><returnval>",
            r#"<rootFolder type="Folder">group-d1</rootFolder>"#,
            r#"<propertyCollector type="PropertyCollector">propertyCollector</propertyCollector>"#,
            r#"<sessionManager type="SessionManager">SessionManager</sessionManager>"#,
            "</returnval></RetrieveServiceContentResponse>"
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "vmware_soap_session=cafe; Path=/")
                .set_body_string(soap("<LoginResponse/>")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "Logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveProperties"))
        .and(body_string_contains("<propSet><type>Datacenter</type>"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(b"not gzip at all".to_vec()),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vcenter_query_error_still_logs_out() {
    let server = broken_vcenter().await;
    let mut cmd = labscope();
    cmd.args(["vcenter", "datacenters", "-o", "plain"])
        .args(["--host", &server.uri(), "-u", "admin", "--password", "VMware1!"]);
    let output = run(cmd).await;
    assert!(!output.status.success(), "{}", combined_output(&output));
    server.verify().await;
}
