#![allow(clippy::unwrap_used)]
// Integration tests for the verification and inventory handlers using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labscope_core::{
    CoreError, EndpointConfig, NsxVerifyRequest, TransportConfig, VcenterVerifyRequest,
    fetch_nsx_inventory, fetch_vcenter_inventory, verify_nsx, verify_vcenter,
};

// ── vSphere fixtures ────────────────────────────────────────────────

fn soap(inner: &str) -> String {
    format!(
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        inner
    )
}

fn returnval(obj_type: &str, mo_ref: &str, props: &[(&str, &str)]) -> String {
    let mut xml = format!(r#"<returnval><obj type="{obj_type}">{mo_ref}</obj>"#);
    for (name, val) in props {
        xml.push_str(&format!(
            r#"<propSet><name>{name}</name><val xsi:type="xsd:string">{val}</val></propSet>"#
        ));
    }
    xml.push_str("</returnval>");
    xml
}

fn objects(returnvals: &[String]) -> String {
    soap(&format!(
        r#"<RetrievePropertiesResponse xmlns="urn:vim25">{}</RetrievePropertiesResponse>"#,
        returnvals.concat()
    ))
}

async fn mount_vsphere_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveServiceContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap(concat!(
            r#"<RetrieveServiceContentResponse xmlns="urn:vim25"><returnval>"#,
            r#"<rootFolder type="Folder">group-d1</rootFolder>"#,
            r#"<propertyCollector type="PropertyCollector">propertyCollector</propertyCollector>"#,
            "<about><fullName>VMware vCenter Server 7.0.3 build-21477706</fullName>",
            "<version>7.0.3</version></about>",
            r#"<sessionManager type="SessionManager">SessionManager</sessionManager>"#,
            "</returnval></RetrieveServiceContentResponse>"
        ))))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "Login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "vmware_soap_session=f00d; Path=/")
                .set_body_string(soap("<LoginResponse xmlns=\"urn:vim25\"/>")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "Logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn mount_type(server: &MockServer, obj_type: &str, body: String) {
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveProperties"))
        .and(body_string_contains(format!("<propSet><type>{obj_type}</type>")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Two datacenters, each with a `vm` root holding Prod and Dev.
async fn mount_lab_vcenter(server: &MockServer) {
    mount_vsphere_login(server).await;
    mount_type(
        server,
        "Datacenter",
        objects(&[
            returnval("Datacenter", "datacenter-2", &[("name", "DC2")]),
            returnval("Datacenter", "datacenter-1", &[("name", "DC1")]),
        ]),
    )
    .await;
    mount_type(
        server,
        "Folder",
        objects(&[
            returnval("Folder", "group-v1", &[("name", "vm"), ("parent", "datacenter-1")]),
            returnval("Folder", "group-v11", &[("name", "Prod"), ("parent", "group-v1")]),
            returnval("Folder", "group-v12", &[("name", "Dev"), ("parent", "group-v1")]),
        ]),
    )
    .await;
    mount_type(
        server,
        "ComputeResource",
        objects(&[returnval("ClusterComputeResource", "domain-c8", &[("name", "Compute")])]),
    )
    .await;
    mount_type(
        server,
        "ResourcePool",
        objects(&[returnval("ResourcePool", "resgroup-9", &[("name", "Resources")])]),
    )
    .await;
    mount_type(server, "StoragePod", objects(&[])).await;
    mount_type(
        server,
        "Datastore",
        objects(&[returnval(
            "Datastore",
            "datastore-14",
            &[
                ("name", "nfs-01"),
                ("summary.capacity", "107374182400"),
                ("summary.freeSpace", "53687091200"),
                ("summary.multipleHostAccess", "true"),
                ("summary.type", "NFS"),
                ("parent", "group-s5"),
            ],
        )]),
    )
    .await;
}

/// Answer the Datacenter query with a gzip body that cannot be decoded.
async fn mount_broken_datacenter_query(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveProperties"))
        .and(body_string_contains("<propSet><type>Datacenter</type>"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_bytes(b"not gzip at all".to_vec()),
        )
        .mount(server)
        .await;
}

async fn logout_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| {
            r.headers
                .get("SOAPAction")
                .is_some_and(|v| v.as_bytes() == b"Logout")
        })
        .count()
}

fn vcenter_request(server: &MockServer, extra: serde_json::Value) -> VcenterVerifyRequest {
    let mut body = json!({
        "hostname": server.uri(),
        "username": "administrator@vsphere.local",
        "password": "VMware1!",
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    VcenterVerifyRequest::from_json(&body.to_string()).unwrap()
}

fn endpoint(server: &MockServer) -> EndpointConfig {
    EndpointConfig::new(server.uri(), "admin", SecretString::from("VMware1!".to_string()))
}

// ── vCenter verification ────────────────────────────────────────────

#[tokio::test]
async fn test_verify_vcenter_runs_requested_checks() {
    let server = MockServer::start().await;
    mount_lab_vcenter(&server).await;

    let req = vcenter_request(
        &server,
        json!({ "datacenter": "DC1", "datastore": "nfs-01", "vmFolder": "Staging", "resourcePool": "Compute" }),
    );
    let resp = verify_vcenter(&req, &TransportConfig::default()).await.unwrap();

    assert!(resp.connected);
    assert_eq!(resp.version.as_deref(), Some("7.0.3 build-21477706"));
    assert_eq!(resp.checks.datacenter, Some(true));
    assert_eq!(resp.checks.vm_folder, Some(false));
    assert_eq!(resp.checks.resource_pool, Some(true));

    let ds = resp.checks.datastore.unwrap();
    assert!(ds.exists);
    assert_eq!(ds.capacity_gb, Some(100));
    assert_eq!(ds.used_gb, Some(50));
}

#[tokio::test]
async fn test_verify_vcenter_skips_unrequested_checks() {
    let server = MockServer::start().await;
    mount_vsphere_login(&server).await;

    let req = vcenter_request(&server, json!({}));
    let resp = verify_vcenter(&req, &TransportConfig::default()).await.unwrap();

    assert!(resp.connected);
    assert_eq!(resp.checks, labscope_core::VcenterChecks::default());
}

#[tokio::test]
async fn test_verify_vcenter_bad_credentials_is_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "RetrieveServiceContent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap(concat!(
            "<returnval>",
            r#"<rootFolder type="Folder">group-d1</rootFolder>"#,
            r#"<propertyCollector type="PropertyCollector">propertyCollector</propertyCollector>"#,
            r#"<sessionManager type="SessionManager">SessionManager</sessionManager>"#,
            "</returnval>"
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sdk"))
        .and(header("SOAPAction", "Login"))
        .respond_with(ResponseTemplate::new(500).set_body_string(soap(
            r#"<soapenv:Fault><detail><InvalidLoginFault xsi:type="InvalidLogin"/></detail></soapenv:Fault>"#,
        )))
        .mount(&server)
        .await;

    let req = vcenter_request(&server, json!({ "datacenter": "DC1" }));
    let resp = verify_vcenter(&req, &TransportConfig::default()).await.unwrap();

    assert!(!resp.connected);
    assert_eq!(resp.message.as_deref(), Some("Invalid credentials"));
    assert_eq!(resp.version, None);
    assert_eq!(resp.checks.datacenter, None);
}

#[tokio::test]
async fn test_verify_vcenter_logs_out_when_a_check_fails() {
    let server = MockServer::start().await;
    mount_vsphere_login(&server).await;
    mount_broken_datacenter_query(&server).await;

    let req = vcenter_request(&server, json!({ "datacenter": "DC1" }));
    let result = verify_vcenter(&req, &TransportConfig::default()).await;

    assert!(result.is_err(), "expected transport error, got: {result:?}");
    assert_eq!(logout_count(&server).await, 1);
}

// ── vCenter inventory ───────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_vcenter_inventory() {
    let server = MockServer::start().await;
    mount_lab_vcenter(&server).await;

    let inv = fetch_vcenter_inventory(&endpoint(&server)).await.unwrap();

    assert_eq!(inv.version, "7.0.3 build-21477706");
    assert_eq!(inv.datacenters, vec!["DC1", "DC2"]);
    let folders: Vec<&str> = inv.vm_folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(folders, vec!["Dev", "Prod"]);
    let pools: Vec<&str> = inv.resource_pools.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(pools, vec!["Compute"]);
    assert_eq!(inv.datastores.len(), 1);
    assert_eq!(inv.datastores[0].free_gb, 50);
}

#[tokio::test]
async fn test_fetch_vcenter_inventory_logs_out_on_query_error() {
    let server = MockServer::start().await;
    mount_vsphere_login(&server).await;
    mount_broken_datacenter_query(&server).await;

    let result = fetch_vcenter_inventory(&endpoint(&server)).await;

    assert!(result.is_err(), "expected transport error, got: {result:?}");
    assert_eq!(logout_count(&server).await, 1);
}

#[tokio::test]
async fn test_fetch_vcenter_inventory_logs_out_once_on_success() {
    let server = MockServer::start().await;
    mount_lab_vcenter(&server).await;

    fetch_vcenter_inventory(&endpoint(&server)).await.unwrap();
    assert_eq!(logout_count(&server).await, 1);
}

#[tokio::test]
async fn test_fetch_vcenter_inventory_unreachable() {
    let config = EndpointConfig::new(
        "http://127.0.0.1:1",
        "admin",
        SecretString::from("pw".to_string()),
    );
    let err = fetch_vcenter_inventory(&config).await.unwrap_err();
    assert!(
        matches!(err, CoreError::ConnectionFailed { .. }),
        "expected ConnectionFailed, got: {err:?}"
    );
}

// ── NSX ─────────────────────────────────────────────────────────────

async fn mount_lab_nsx(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/node"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "product_version": "4.1.0.2" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/transport-zones"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [
            { "id": "1", "display_name": "Z1", "transport_type": "OVERLAY" },
            { "id": "2", "display_name": "Z2", "transport_type": "OVERLAY" },
            { "id": "3", "display_name": "Z3", "transport_type": "VLAN" }
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/edge-clusters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [
            { "id": "ec", "display_name": "edge-cluster-01" }
        ]})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/policy/api/v1/infra/tier-0s"))
        .respond_with(ResponseTemplate::new(403))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_verify_nsx_checks() {
    let server = MockServer::start().await;
    mount_lab_nsx(&server).await;

    let body = json!({
        "hostname": server.uri(),
        "username": "admin",
        "password": "VMware1!VMware1!",
        "transportZone": "Z3",
        "edgeCluster": "edge-cluster-01",
        "t0Gateway": "T0"
    });
    let req = NsxVerifyRequest::from_json(&body.to_string()).unwrap();
    let resp = verify_nsx(&req, &TransportConfig::default()).await.unwrap();

    assert!(resp.connected);
    assert_eq!(resp.version.as_deref(), Some("4.1.0.2"));
    // Z3 is a VLAN zone and is not offered.
    assert_eq!(resp.checks.transport_zone, Some(false));
    assert_eq!(resp.checks.edge_cluster, Some(true));
    assert_eq!(resp.checks.t0_gateway, Some(false));
}

#[tokio::test]
async fn test_verify_nsx_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/node"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let body = json!({ "hostname": server.uri(), "username": "admin", "password": "nope" });
    let req = NsxVerifyRequest::from_json(&body.to_string()).unwrap();
    let resp = verify_nsx(&req, &TransportConfig::default()).await.unwrap();

    assert!(!resp.connected);
    assert_eq!(resp.message.as_deref(), Some("Invalid credentials"));
}

#[tokio::test]
async fn test_fetch_nsx_inventory() {
    let server = MockServer::start().await;
    mount_lab_nsx(&server).await;

    let inv = fetch_nsx_inventory(&endpoint(&server)).await.unwrap();

    assert_eq!(inv.version, "4.1.0.2");
    assert_eq!(inv.transport_zones, vec!["Z1", "Z2"]);
    assert_eq!(inv.edge_clusters, vec!["edge-cluster-01"]);
    assert!(inv.t0_gateways.is_empty());
}

#[tokio::test]
async fn test_fetch_nsx_inventory_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/node"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = fetch_nsx_inventory(&endpoint(&server)).await.unwrap_err();
    assert!(err.is_auth_failure(), "expected auth failure, got: {err:?}");
}
