//! Architecture dispatch through the factory.

use btsite_core::{SiteConfig, SiteError};
use serde_json::json;

use crate::fixtures::{Harness, mtorrent_site, nexus_site};

#[test]
fn test_factory_builds_registered_architectures() {
    let harness = Harness::new();
    assert_eq!(harness.factory.architectures(), vec!["MTorrent", "NexusPhp"]);

    let nexus = harness.factory.create(nexus_site()).unwrap();
    assert_eq!(nexus.site().name, "Nexus Example");

    let mteam = harness.factory.create(mtorrent_site()).unwrap();
    assert_eq!(mteam.site().name, "M-Team");
}

#[test]
fn test_factory_rejects_unknown_architecture() {
    let harness = Harness::new();
    harness.registry.insert(SiteConfig {
        code: "gazelle".to_string(),
        schema: "Gazelle".to_string(),
        ..Default::default()
    });

    let mut site = nexus_site();
    site.code = "gazelle".to_string();
    let error = harness.factory.create(site).unwrap_err();

    assert!(matches!(&error, SiteError::InvalidSchema { schema } if schema == "Gazelle"));
    assert_eq!(error.to_string(), "无效架构: Gazelle");
}

#[test]
fn test_factory_requires_config() {
    let harness = Harness::new();
    let mut site = nexus_site();
    site.code = "unknown".to_string();

    let error = harness.factory.create(site).unwrap_err();
    assert!(error.is_config_error());
    assert!(harness.engine.calls().is_empty());
}

#[tokio::test]
async fn test_derived_client_delegates_shared_operations() {
    let harness = Harness::new();
    let client = harness.factory.create(mtorrent_site()).unwrap();

    harness
        .engine
        .push_data("latest_notice", json!({"title": "Rules updated", "date": "1714550400"}));
    harness.engine.push_data("details", json!({"absent": false, "hr": 1}));

    let notice = client.latest_notice().await.unwrap().unwrap();
    assert_eq!(notice.title, "Rules updated");
    assert_eq!(notice.date, 1_714_550_400);

    let detail = client.details("9").await.unwrap();
    assert!(detail.hr);

    let keys: Vec<_> = harness.engine.calls().into_iter().map(|call| call.key).collect();
    assert_eq!(keys, vec!["latest_notice", "details"]);
}

#[tokio::test]
async fn test_site_identity_reaches_every_request() {
    let harness = Harness::new();
    let nexus = harness.factory.create(nexus_site()).unwrap();
    let mteam = harness.factory.create(mtorrent_site()).unwrap();

    harness.engine.push_data("details", json!({}));
    harness.engine.push_data("details", json!({}));
    nexus.details("1").await.unwrap();
    mteam.details("2").await.unwrap();

    let calls = harness.engine.calls_for("details");
    let nexus_request = &calls[0].request;
    assert_eq!(nexus_request.env["userId"], "42");
    assert_eq!(nexus_request.env["domain"], "https://nexus.example/");
    assert_eq!(nexus_request.cookie, "c_secure_uid=42");
    // A value containing ':' splits into too many parts and is dropped.
    assert!(!nexus_request.headers.contains_key("Referer"));
    assert_eq!(nexus_request.headers["Accept"], " text/html");

    let mteam_request = &calls[1].request;
    assert_eq!(mteam_request.env["userId"], "1001");
    assert_eq!(mteam_request.env["api"], "https://api.mteam.example");
    assert!(!mteam_request.env.contains_key("domain"));
    assert_eq!(mteam_request.headers["x-api-key"], " secret");
}
