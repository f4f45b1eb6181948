//! Configuration edits take effect on the next call of a live client.

use btsite_core::{Client, SiteConfig, SiteError};
use serde_json::json;

use crate::fixtures::{Harness, nexus_site};

#[tokio::test]
async fn test_capability_change_applies_to_existing_client() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness
        .engine
        .push_list("my_hr", vec![json!({"id": "3", "name": "Dune"})], "");
    assert_eq!(client.my_hr().await.unwrap().len(), 1);

    let mut config = (*harness.registry_config("nexus")).clone();
    config.price.has_hr = false;
    harness.registry.insert(config);

    assert!(client.my_hr().await.unwrap().is_empty());
    assert_eq!(harness.engine.calls_for("my_hr").len(), 1);
}

#[tokio::test]
async fn test_removed_config_fails_with_context() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();
    harness.registry.remove("nexus");

    let error = client.my_hr().await.unwrap_err();
    assert!(error.is_config_error());
    assert!(matches!(&error, SiteError::Operation { operation, .. } if operation == "HR列表失败"));
    assert_eq!(
        error.to_string(),
        "站点(Nexus Example)HR列表失败, 异常: 站点配置不存在: nexus"
    );
}

#[tokio::test]
async fn test_message_counting_toggle() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness
        .engine
        .push_data("user_basic_info", json!({"is_login": true, "unread_message_count": 5}));
    assert_eq!(client.user_basic_info().await.unwrap().unread_message_count, 5);

    harness.registry.insert(SiteConfig {
        count_message: true,
        ..(*harness.registry_config("nexus")).clone()
    });
    harness
        .engine
        .push_data("user_basic_info", json!({"is_login": true, "unread_message_count": 5}));
    harness
        .engine
        .push_list("unread_messages", vec![json!({"head": "hi"})], "");

    assert_eq!(client.user_basic_info().await.unwrap().unread_message_count, 1);
}
