//! Paginated totals stop at a cap, at repeated cursors and on errors.

use std::time::{Duration, Instant};

use btsite_core::{ClientSettings, EngineError, SiteError};
use serde_json::json;

use crate::fixtures::{Harness, fast_settings, mtorrent_site, nexus_site};

const SEEDING: &str = "seeding_statistics";

fn cursor_key(cursor: &str) -> String {
    format!("{SEEDING}|{cursor}")
}

#[tokio::test]
async fn test_cursor_walk_hits_page_cap() {
    let harness = Harness::with_settings(fast_settings(3));
    let client = harness.factory.create(nexus_site()).unwrap();

    harness.engine.push_list(SEEDING, vec![json!({"size": 1})], "page=1");
    harness.engine.push_list(&cursor_key("page=1"), vec![json!({"size": 1})], "page=2");
    harness.engine.push_list(&cursor_key("page=2"), vec![json!({"size": 1})], "page=3");
    harness.engine.push_list(&cursor_key("page=3"), vec![json!({"size": 1})], "");

    let error = client.seeding_statistics().await.unwrap_err();
    assert!(matches!(error, SiteError::PaginationLimit { pages: 3 }));
    assert_eq!(harness.engine.pending(), 1);
}

#[tokio::test]
async fn test_cyclic_cursor_ends_walk() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness.engine.push_list(SEEDING, vec![json!({"size": 10})], "page=1");
    harness.engine.push_list(&cursor_key("page=1"), vec![json!({"size": 20})], "page=1");

    let stats = client.seeding_statistics().await.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.size, 30);
}

#[tokio::test]
async fn test_numbered_walk_hits_page_cap() {
    let harness = Harness::with_settings(fast_settings(2));
    let client = harness.factory.create(mtorrent_site()).unwrap();

    for _ in 0..3 {
        harness
            .engine
            .push_list("user_torrent_list", vec![json!({"size": 5})], "");
    }

    let error = client.seeding_statistics().await.unwrap_err();
    assert!(matches!(error, SiteError::PaginationLimit { pages: 2 }));
}

#[tokio::test]
async fn test_failed_page_aborts_walk() {
    let harness = Harness::new();
    let client = harness.factory.create(mtorrent_site()).unwrap();

    harness
        .engine
        .push_list("user_torrent_list", vec![json!({"size": 5})], "");
    harness.engine.push_error(
        "user_torrent_list",
        EngineError::Transport {
            reason: "timed out".to_string(),
        },
    );

    let error = client.seeding_statistics().await.unwrap_err();
    assert!(error.to_string().contains("用户做种列表异常"));
    assert!(error.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_pages_are_spaced_by_delay() {
    let settings = ClientSettings {
        page_delay: Duration::from_millis(25),
        ..fast_settings(10)
    };
    let harness = Harness::with_settings(settings);
    let client = harness.factory.create(mtorrent_site()).unwrap();

    harness
        .engine
        .push_list("user_torrent_list", vec![json!({"size": 1})], "");
    harness
        .engine
        .push_list("user_torrent_list", vec![json!({"size": 2})], "");
    harness.engine.push_list("user_torrent_list", Vec::new(), "");

    let started = Instant::now();
    let stats = client.seeding_statistics().await.unwrap();

    assert_eq!(stats.count, 2);
    assert!(started.elapsed() >= Duration::from_millis(50));
}
