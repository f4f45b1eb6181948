//! Request shapes produced for the engine by each architecture.

use btsite_core::{MediaType, SearchParams};
use proptest::prelude::*;
use serde_json::json;

use crate::fixtures::{Harness, mtorrent_site, nexus_site};

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn test_nexus_search_filters_by_category() {
    let harness = Harness::new();
    let client = harness.factory.create(nexus_site()).unwrap();

    harness.engine.push_data(
        "search",
        json!([{"id": "1", "title": "Dune", "details": "details.php?id=1", "download": "download.php?id=1"}]),
    );

    let torrents = client
        .search(&SearchParams::new("dune", MediaType::Tv).with_page(1))
        .await
        .unwrap();
    assert_eq!(torrents[0].page_url, "https://site.example/details.php?id=1");

    let request = &harness.engine.calls_for("search")[0].request;
    assert_eq!(param(&request.params, "search_mode"), Some("0"));
    assert_eq!(param(&request.params, "page"), Some("1"));
    assert_eq!(param(&request.params, "notnewword"), Some("1"));
    assert_eq!(param(&request.params, "cat"), Some("402"));
    assert_eq!(request.env["keyword"], "dune");
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_api_search_sends_body() {
    let harness = Harness::new();
    let client = harness.factory.create(mtorrent_site()).unwrap();
    harness.engine.push_list("search", Vec::new(), "");

    client
        .search(&SearchParams::new("dune", MediaType::Anime))
        .await
        .unwrap();

    let request = &harness.engine.calls_for("search")[0].request;
    let body = request.body.as_ref().unwrap();
    assert_eq!(body["mode"], "normal");
    assert_eq!(body["pageNumber"], 1);
    assert!(request.params.is_empty());
}

#[tokio::test]
async fn test_rss_reads_feed_url() {
    let harness = Harness::new();
    let site = nexus_site();
    let feed_url = site.rss_url.clone();
    let client = harness.factory.create(site).unwrap();

    harness.engine.push_raw(
        &feed_url,
        r#"<rss version="2.0"><channel>
            <item><title>Only link</title><link>https://nexus.example/download.php?id=5</link><pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate></item>
            <item><title></title><link>https://nexus.example/download.php?id=6</link></item>
            <item><title>No links</title></item>
        </channel></rss>"#,
    );

    let torrents = client.rss().await.unwrap();
    assert_eq!(torrents.len(), 1);
    assert_eq!(torrents[0].enclosure, "https://nexus.example/download.php?id=5");
    assert!(torrents[0].link.is_empty());
    assert_eq!(torrents[0].pub_date, 1_704_067_200);
}

#[tokio::test]
async fn test_malformed_feed_is_reported() {
    let harness = Harness::new();
    let site = nexus_site();
    let feed_url = site.rss_url.clone();
    let client = harness.factory.create(site).unwrap();

    harness
        .engine
        .push_raw(&feed_url, "<rss><channel><item></channel></rss>");

    let error = client.rss().await.unwrap_err();
    assert!(error.to_string().contains("解析 RSS xml 数据异常"));
}

proptest! {
    #[test]
    fn test_api_search_pages_from_one(page in 0u32..10_000) {
        let harness = Harness::new();
        let client = harness.factory.create(mtorrent_site()).unwrap();
        harness.engine.push_list("search", Vec::new(), "");

        tokio_test::block_on(
            client.search(&SearchParams::new("", MediaType::Movie).with_page(page)),
        )
        .unwrap();

        let request = &harness.engine.calls_for("search")[0].request;
        let body = request.body.as_ref().unwrap();
        prop_assert_eq!(body["pageNumber"].as_u64(), Some(u64::from(page) + 1));
    }
}
