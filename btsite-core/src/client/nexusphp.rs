//! Client for template-driven NexusPHP-style forum trackers.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use super::{Client, sign_in_precheck, simulated_sign_in};
use crate::config::{Categories, RequestDefinition};
use crate::context::SiteContext;
use crate::errors::SiteError;
use crate::lenient::{de_bool, de_f64, de_i64, de_string, de_u32};
use crate::pagination::{Page, PageWalker};
use crate::request::{Pairs, RequestId, RequestParams};
use crate::rss;
use crate::types::{
    HrTorrent, MediaType, Message, Notice, RssTorrent, SearchParams, SearchTorrent,
    SeedingStatistics, SignInCode, SignInResult, Site, TorrentDetail, TorrentRow, UserBasicInfo,
    UserDetails,
};
use crate::url::{is_absolute, join_url, resolve_download_link, resolve_page_link};

/// Copper value of one gold coin.
const COPPER_PER_GOLD: f64 = 10_000.0;
/// Copper value of one silver coin.
const COPPER_PER_SILVER: f64 = 100.0;

/// Landing-page account summary, including the coin subunits some sites
/// report instead of a single bonus value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BasicInfoRecord {
    #[serde(deserialize_with = "de_bool")]
    is_login: bool,
    #[serde(deserialize_with = "de_bool")]
    signed_in: bool,
    #[serde(deserialize_with = "de_string")]
    id: String,
    #[serde(deserialize_with = "de_string")]
    name: String,
    #[serde(deserialize_with = "de_u32")]
    unread_message_count: u32,
    #[serde(deserialize_with = "de_f64")]
    ratio: f64,
    #[serde(deserialize_with = "de_i64")]
    uploaded: i64,
    #[serde(deserialize_with = "de_i64")]
    downloaded: i64,
    #[serde(deserialize_with = "de_f64")]
    bonus: f64,
    #[serde(rename = "Gold", deserialize_with = "de_f64")]
    gold: f64,
    #[serde(rename = "Silver", deserialize_with = "de_f64")]
    silver: f64,
    #[serde(rename = "Copper", deserialize_with = "de_f64")]
    copper: f64,
}

impl BasicInfoRecord {
    /// Fills in ratio and bonus when the site reports them as zero.
    fn normalize(self) -> UserBasicInfo {
        let mut ratio = self.ratio;
        if ratio == 0.0 && self.downloaded > 0 {
            ratio = (self.uploaded as f64 / self.downloaded as f64 * 1000.0).round() / 1000.0;
        }

        let mut bonus = self.bonus;
        if bonus == 0.0 && (self.gold != 0.0 || self.silver != 0.0 || self.copper != 0.0) {
            bonus = self.gold * COPPER_PER_GOLD + self.silver * COPPER_PER_SILVER + self.copper;
        }

        UserBasicInfo {
            is_login: self.is_login,
            signed_in: self.signed_in,
            id: self.id,
            name: self.name,
            unread_message_count: self.unread_message_count,
            ratio,
            uploaded: self.uploaded,
            downloaded: self.downloaded,
            bonus,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct SeedingRow {
    #[serde(deserialize_with = "de_i64")]
    size: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct SignInOutcome {
    #[serde(deserialize_with = "de_bool")]
    signed_in: bool,
}

/// Builds the query of a torrent search.
///
/// Keyword searches add the site's category filters for the requested media
/// type; browsing without a keyword only sends the page.
pub(crate) fn search_query(categories: Option<&Categories>, params: &SearchParams) -> Pairs {
    let page = ("page".to_string(), params.page.to_string());
    if params.keyword.is_empty() {
        return vec![page];
    }

    let mut query = vec![
        ("search_mode".to_string(), "0".to_string()),
        page,
        ("notnewword".to_string(), "1".to_string()),
    ];

    if let Some(categories) = categories {
        let selected: Vec<&str> = match params.media_type {
            MediaType::Movie => categories.movie.iter().map(|c| c.id.as_str()).collect(),
            MediaType::Tv => categories.tv.iter().map(|c| c.id.as_str()).collect(),
            MediaType::Anime | MediaType::Other => categories
                .movie
                .iter()
                .chain(&categories.tv)
                .map(|c| c.id.as_str())
                .collect(),
        };

        if !categories.field.is_empty() {
            if !selected.is_empty() {
                query.push((categories.field.clone(), selected.join(&categories.delimiter)));
            }
        } else {
            query.extend(selected.into_iter().map(|id| (id.to_string(), "1".to_string())));
        }
    }

    query
}

/// Client for the NexusPHP family of tracker sites.
#[derive(Debug, Clone)]
pub struct NexusPhpClient {
    ctx: SiteContext,
}

impl NexusPhpClient {
    pub fn new(ctx: SiteContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SiteContext {
        &self.ctx
    }

    /// Sizes of the torrents on one page of the seeding list, plus the
    /// cursor of the next page. An empty `cursor` fetches the first page.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The page could not be fetched or decoded
    pub async fn current_page_seeding(&self, cursor: &str) -> Result<Page<i64, String>, SiteError> {
        let listed = self
            .ctx
            .fetch_list::<SeedingRow>(
                RequestParams::named(RequestId::SeedingStatistics).with_path(cursor),
                "解析做种信息列表失败",
            )
            .await?;
        let sizes = listed.items.into_iter().map(|row| row.size).collect();
        Ok(Page::with_cursor(sizes, listed.next_page))
    }

    async fn unread_message_detail(&self, url: &str) -> Result<Message, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<Message>(
                RequestParams::named(RequestId::UnreadMessageDetail).with_path(url),
                "用户未读消息详情失败",
            )
            .await?;
        Ok(fetched.value)
    }
}

#[async_trait]
impl Client for NexusPhpClient {
    fn site(&self) -> &Site {
        self.ctx.site()
    }

    async fn favicon(&self) -> Result<Bytes, SiteError> {
        let raw = self
            .ctx
            .fetch_raw(RequestParams::named(RequestId::Favicon), "获取 favicon 异常")
            .await?;
        Ok(raw.data)
    }

    async fn user_basic_info(&self) -> Result<UserBasicInfo, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<BasicInfoRecord>(
                RequestParams::named(RequestId::UserBasicInfo),
                "解析基础信息失败",
            )
            .await?;
        let mut info = fetched.value.normalize();

        let config = self.ctx.config_for("解析基础信息失败")?;
        if config.count_message {
            let messages = self.unread_messages(false).await?;
            info.unread_message_count = u32::try_from(messages.len()).unwrap_or(u32::MAX);
        }
        Ok(info)
    }

    async fn user_details(&self) -> Result<UserDetails, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<UserDetails>(
                RequestParams::named(RequestId::UserDetails),
                "解析用户详情信息异常",
            )
            .await?;
        Ok(fetched.value)
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchTorrent>, SiteError> {
        let config = self.ctx.config_for("未获取到站点配置")?;
        let query = search_query(config.categories.as_ref(), params);
        tracing::debug!(
            "Searching {} for '{}' ({}, page {})",
            self.ctx.site().code,
            params.keyword,
            params.media_type.code(),
            params.page
        );

        let fetched = self
            .ctx
            .fetch_data::<Vec<TorrentRow>>(
                RequestParams::named(RequestId::Search)
                    .with_params(query)
                    .env_var("keyword", params.keyword.clone()),
                "解析种子列表失败",
            )
            .await?;

        let base = fetched.request_url;
        fetched
            .value
            .into_iter()
            .map(|mut row| -> Result<SearchTorrent, SiteError> {
                let page_url = resolve_page_link(&base, &row.details)
                    .map_err(|e| self.ctx.fail("搜索种子拼接 details 错误", e))?;
                let enclosure = resolve_download_link(&base, &row.download)
                    .map_err(|e| self.ctx.fail("搜索种子解析 download 错误", e))?;
                let labels = std::mem::take(&mut row.labels);
                Ok(row.into_search_torrent(page_url, enclosure, labels))
            })
            .collect()
    }

    async fn seeding_statistics(&self) -> Result<SeedingStatistics, SiteError> {
        let config = self.ctx.config_for("做种信息失败")?;
        let single_page = config
            .request_definition(RequestId::SeedingStatistics.as_str())
            .is_some_and(|definition| !definition.is_paginated());

        if single_page {
            let fetched = self
                .ctx
                .fetch_data::<SeedingStatistics>(
                    RequestParams::named(RequestId::SeedingStatistics),
                    "做种信息失败",
                )
                .await?;
            return Ok(fetched.value);
        }

        let stats = PageWalker::from_settings(self.ctx.settings())
            .fold(
                String::new(),
                SeedingStatistics::default(),
                |cursor: String| async move { self.current_page_seeding(&cursor).await },
                |stats, size| SeedingStatistics {
                    count: stats.count + 1,
                    size: stats.size + size,
                },
            )
            .await?;

        tracing::info!(
            "Site {} seeds {} torrents ({} bytes)",
            self.ctx.site().code,
            stats.count,
            stats.size
        );
        Ok(stats)
    }

    async fn my_hr(&self) -> Result<Vec<HrTorrent>, SiteError> {
        let config = self.ctx.config_for("HR列表失败")?;
        if !config.price.has_hr {
            return Ok(Vec::new());
        }

        let listed = self
            .ctx
            .fetch_list::<HrTorrent>(RequestParams::named(RequestId::MyHr), "HR列表失败")
            .await?;
        Ok(listed.items)
    }

    async fn unread_messages(&self, detail: bool) -> Result<Vec<Message>, SiteError> {
        let listed = self
            .ctx
            .fetch_list::<Message>(RequestParams::named(RequestId::UnreadMessages), "未读消息列表异常")
            .await?;
        let mut messages = listed.items;
        if !detail {
            return Ok(messages);
        }

        // A relative cursor is first resolved against the listing page.
        let base = match (listed.next_page.as_str(), listed.request_url.as_str()) {
            ("", _) => String::new(),
            (cursor, _) if is_absolute(cursor) => cursor.to_string(),
            (_, "") => String::new(),
            (cursor, page) => {
                join_url(page, cursor).map_err(|e| self.ctx.fail("用户未读消息详情失败", e))?
            }
        };
        for message in &mut messages {
            // Without a cursor the link stays relative and the engine resolves it.
            let url = if base.is_empty() {
                message.link.clone()
            } else {
                join_url(&base, &message.link)
                    .map_err(|e| self.ctx.fail("用户未读消息详情失败", e))?
            };
            let body = self.unread_message_detail(&url).await?;
            message.content = body.content;
        }
        Ok(messages)
    }

    async fn latest_notice(&self) -> Result<Option<Notice>, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<Notice>(RequestParams::named(RequestId::LatestNotice), "解析最近公告失败")
            .await?;
        let notice = fetched.value;
        if notice.title.is_empty() {
            return Ok(None);
        }
        Ok(Some(notice))
    }

    async fn rss(&self) -> Result<Vec<RssTorrent>, SiteError> {
        let definition = RequestDefinition::raw_get(self.ctx.site().rss_url.clone());
        let raw = self
            .ctx
            .fetch_raw(RequestParams::ad_hoc(definition), "获取 RSS 数据异常")
            .await?;
        rss::parse_torrents(&raw.data).map_err(|e| self.ctx.fail("解析 RSS xml 数据异常", e))
    }

    async fn sign_in(&self) -> Result<SignInResult, SiteError> {
        let info = self.user_basic_info().await?;
        if let Some(result) = sign_in_precheck(&info) {
            return Ok(result);
        }

        let config = self.ctx.config_for("签到异常")?;
        if !config.required.sign_in {
            return Ok(simulated_sign_in());
        }

        let fetched = self
            .ctx
            .fetch_data::<SignInOutcome>(RequestParams::named(RequestId::SignIn), "签到异常")
            .await?;
        if fetched.value.signed_in {
            return Ok(SignInResult::new(SignInCode::Success, "签到成功"));
        }

        tracing::warn!(
            "Sign-in on {} rejected with status {}",
            self.ctx.site().code,
            fetched.status
        );
        if fetched.status == 200 {
            return Ok(SignInResult::new(
                SignInCode::Failure,
                "签到失败，请检查该站点是否已适配",
            ));
        }
        Ok(SignInResult::new(
            SignInCode::Failure,
            format!("签到失败，状态码：{}", fetched.status),
        ))
    }

    async fn download_url(&self, torrent: &SearchTorrent) -> Result<String, SiteError> {
        Ok(torrent.enclosure.clone())
    }

    async fn details(&self, id: &str) -> Result<TorrentDetail, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<TorrentDetail>(
                RequestParams::named(RequestId::Details).env_var("id", id),
                "获取详情异常",
            )
            .await?;
        Ok(fetched.value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::config::{
        ClientSettings, MediaCategory, PriceConfig, RequiredConfig, SCHEMA_NEXUS_PHP, SiteConfig,
        SiteConfigRegistry,
    };
    use crate::engine::{DataResponse, EngineError, ListResponse, ScriptedEngine};

    const RSS_URL: &str = "https://site.example/torrentrss.php?passkey=abc";

    fn site() -> Site {
        Site {
            code: "example".to_string(),
            name: "Example".to_string(),
            user_id: "42".to_string(),
            domain: "https://site.example/".to_string(),
            rss_url: RSS_URL.to_string(),
            ..Default::default()
        }
    }

    fn client_with(config: SiteConfig) -> (NexusPhpClient, Arc<ScriptedEngine>) {
        let registry = SiteConfigRegistry::new();
        registry.insert(SiteConfig {
            code: "example".to_string(),
            name: "Example".to_string(),
            schema: SCHEMA_NEXUS_PHP.to_string(),
            ..config
        });
        let engine = Arc::new(ScriptedEngine::new());
        let ctx = SiteContext::new(
            Arc::new(site()),
            Arc::new(registry),
            engine.clone(),
            ClientSettings::for_testing(),
        );
        (NexusPhpClient::new(ctx), engine)
    }

    fn client() -> (NexusPhpClient, Arc<ScriptedEngine>) {
        client_with(SiteConfig::default())
    }

    fn categories(field: &str) -> Categories {
        let category = |id: &str| MediaCategory {
            id: id.to_string(),
            ..Default::default()
        };
        Categories {
            field: field.to_string(),
            delimiter: ",".to_string(),
            movie: vec![category("401"), category("419")],
            tv: vec![category("402")],
        }
    }

    fn status_response(value: serde_json::Value, status: u16) -> DataResponse {
        DataResponse {
            value,
            request_url: "https://site.example/attendance.php".to_string(),
            status,
        }
    }

    #[tokio::test]
    async fn test_ratio_recomputed_when_reported_zero() {
        let (client, engine) = client();
        engine.push_data(
            "user_basic_info",
            json!({"is_login": true, "uploaded": 300, "downloaded": 100, "ratio": 0}),
        );

        let info = client.user_basic_info().await.unwrap();
        assert_eq!(info.ratio, 3.0);
    }

    #[tokio::test]
    async fn test_ratio_rounds_to_three_decimals() {
        let (client, engine) = client();
        engine.push_data("user_basic_info", json!({"uploaded": 1, "downloaded": 3}));

        let info = client.user_basic_info().await.unwrap();
        assert_eq!(info.ratio, 0.333);
    }

    #[tokio::test]
    async fn test_bonus_recomputed_from_coins() {
        let (client, engine) = client();
        engine.push_data(
            "user_basic_info",
            json!({"bonus": 0, "Gold": 1, "Silver": "2", "Copper": 3}),
        );

        let info = client.user_basic_info().await.unwrap();
        assert_eq!(info.bonus, 10203.0);
    }

    #[tokio::test]
    async fn test_reported_values_are_kept() {
        let (client, engine) = client();
        engine.push_data(
            "user_basic_info",
            json!({
                "is_login": true,
                "name": "alice",
                "ratio": "1.5",
                "uploaded": "1,500",
                "downloaded": 1000,
                "bonus": "12,345.6",
                "Gold": 9,
                "unread_message_count": 4
            }),
        );

        let info = client.user_basic_info().await.unwrap();
        assert_eq!(info.name, "alice");
        assert_eq!(info.ratio, 1.5);
        assert_eq!(info.uploaded, 1500);
        assert_eq!(info.bonus, 12345.6);
        assert_eq!(info.unread_message_count, 4);
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_message_counting_overrides_reported_count() {
        let (client, engine) = client_with(SiteConfig {
            count_message: true,
            ..Default::default()
        });
        engine.push_data("user_basic_info", json!({"unread_message_count": 7}));
        engine.push_list(
            "unread_messages",
            vec![json!({"head": "a"}), json!({"head": "b"})],
            "",
        );

        let info = client.user_basic_info().await.unwrap();
        assert_eq!(info.unread_message_count, 2);
        assert!(engine.calls_for("unread_message_detail").is_empty());
    }

    #[tokio::test]
    async fn test_user_details_and_favicon() {
        let (client, engine) = client();
        engine.push_data(
            "user_details",
            json!({"level": "Power User", "join_at": "1600000000", "last_accessed": 1700000000}),
        );
        engine.push_raw("favicon", &b"icon"[..]);

        let details = client.user_details().await.unwrap();
        assert_eq!(details.level, "Power User");
        assert_eq!(details.join_at, 1_600_000_000);
        assert_eq!(details.last_accessed, 1_700_000_000);

        assert_eq!(client.favicon().await.unwrap(), Bytes::from_static(b"icon"));
    }

    #[test]
    fn test_search_query_joins_categories_into_field() {
        let params = SearchParams::new("dune", MediaType::Movie).with_page(2);
        let query = search_query(Some(&categories("cat")), &params);

        assert_eq!(
            query,
            vec![
                ("search_mode".to_string(), "0".to_string()),
                ("page".to_string(), "2".to_string()),
                ("notnewword".to_string(), "1".to_string()),
                ("cat".to_string(), "401,419".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_query_flags_each_category() {
        let params = SearchParams::new("dune", MediaType::Anime);
        let query = search_query(Some(&categories("")), &params);

        let flags: Vec<_> = query.iter().skip(3).cloned().collect();
        assert_eq!(
            flags,
            vec![
                ("401".to_string(), "1".to_string()),
                ("419".to_string(), "1".to_string()),
                ("402".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_query_shared_field_without_categories_is_omitted() {
        let empty = Categories {
            movie: Vec::new(),
            tv: Vec::new(),
            ..categories("cat")
        };
        let params = SearchParams::new("dune", MediaType::Movie);
        let query = search_query(Some(&empty), &params);

        assert_eq!(query.len(), 3);
        assert!(query.iter().all(|(key, _)| key != "cat"));
    }

    #[test]
    fn test_search_query_without_keyword_only_pages() {
        let params = SearchParams::new("", MediaType::Tv).with_page(3);
        let query = search_query(Some(&categories("cat")), &params);
        assert_eq!(query, vec![("page".to_string(), "3".to_string())]);
    }

    #[tokio::test]
    async fn test_search_resolves_links() {
        let (client, engine) = client();
        engine.push_data_response(
            "search",
            DataResponse {
                value: json!([
                    {
                        "id": "1",
                        "title": "Dune",
                        "details": "details.php?id=1",
                        "download": "download.php?id=1",
                        "size": "2048",
                        "downloadvolumefactor": 0,
                        "uploadvolumefactor": 1,
                        "labels": ["官方", "中字"],
                        "hr_days": 3
                    },
                    {
                        "id": "2",
                        "details": "https://mirror.example/details.php?id=2",
                        "download": "magnet:?xt=urn:btih:abc"
                    }
                ]),
                request_url: "https://site.example/torrents.php?search=dune".to_string(),
                status: 200,
            },
        );

        let torrents = client
            .search(&SearchParams::new("dune", MediaType::Movie))
            .await
            .unwrap();

        assert_eq!(torrents.len(), 2);
        assert_eq!(torrents[0].page_url, "https://site.example/details.php?id=1");
        assert_eq!(torrents[0].enclosure, "https://site.example/download.php?id=1");
        assert_eq!(torrents[0].size, 2048);
        assert_eq!(torrents[0].labels, vec!["官方", "中字"]);
        assert!(torrents[0].hit_and_run);
        assert_eq!(torrents[1].page_url, "https://mirror.example/details.php?id=2");
        assert_eq!(torrents[1].enclosure, "magnet:?xt=urn:btih:abc");
        assert!(!torrents[1].hit_and_run);

        let call = &engine.calls_for("search")[0];
        assert_eq!(call.request.env.get("keyword").map(String::as_str), Some("dune"));
        assert_eq!(call.request.env.get("userId").map(String::as_str), Some("42"));
    }

    #[tokio::test]
    async fn test_seeding_statistics_follows_cursor() {
        let (client, engine) = client();
        engine.push_list(
            "seeding_statistics",
            vec![json!({"size": 10}), json!({"size": "20"})],
            "getusertorrentlist.php?page=1",
        );
        engine.push_list(
            "seeding_statistics|getusertorrentlist.php?page=1",
            vec![json!({"size": 30})],
            "",
        );

        let stats = client.seeding_statistics().await.unwrap();
        assert_eq!(stats, SeedingStatistics { count: 3, size: 60 });
        assert_eq!(engine.pending(), 0);
    }

    #[tokio::test]
    async fn test_seeding_statistics_single_request() {
        let mut definitions = HashMap::new();
        definitions.insert(
            "seeding_statistics".to_string(),
            RequestDefinition {
                method: "GET".to_string(),
                path: "userdetails.php".to_string(),
                ..Default::default()
            },
        );
        let (client, engine) = client_with(SiteConfig {
            request_definitions: definitions,
            ..Default::default()
        });
        engine.push_data("seeding_statistics", json!({"count": "5", "size": 1000}));

        let stats = client.seeding_statistics().await.unwrap();
        assert_eq!(stats, SeedingStatistics { count: 5, size: 1000 });
    }

    #[tokio::test]
    async fn test_seeding_statistics_fails_without_partial_total() {
        let (client, engine) = client();
        engine.push_list("seeding_statistics", vec![json!({"size": 10})], "page=1");
        engine.push_error(
            "seeding_statistics|page=1",
            EngineError::Transport {
                reason: "reset".to_string(),
            },
        );

        let err = client.seeding_statistics().await.unwrap_err();
        assert!(err.to_string().contains("解析做种信息列表失败"));
    }

    #[tokio::test]
    async fn test_my_hr_skips_request_without_review() {
        let (client, engine) = client();
        assert!(client.my_hr().await.unwrap().is_empty());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_my_hr_lists_reviews() {
        let (client, engine) = client_with(SiteConfig {
            price: PriceConfig { has_hr: true },
            ..Default::default()
        });
        engine.push_list("my_hr", vec![json!({"id": 7, "name": "Dune"})], "");

        let reviews = client.my_hr().await.unwrap();
        assert_eq!(reviews[0].id, "7");
        assert_eq!(reviews[0].name, "Dune");
    }

    #[tokio::test]
    async fn test_unread_message_details_are_followed() {
        let (client, engine) = client();
        engine.push_list_response(
            "unread_messages",
            ListResponse {
                items: vec![json!({"head": "Welcome", "link": "messages.php?action=viewmessage&id=9"})],
                domain: "https://site.example/".to_string(),
                request_url: "https://site.example/messages.php".to_string(),
                next_page: "https://site.example/messages.php?action=viewmailbox".to_string(),
            },
        );
        engine.push_data(
            "unread_message_detail|https://site.example/messages.php?action=viewmessage&id=9",
            json!({"content": "hello"}),
        );

        let messages = client.unread_messages(true).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].head, "Welcome");
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_unread_message_details_follow_relative_cursor() {
        let (client, engine) = client();
        engine.push_list_response(
            "unread_messages",
            ListResponse {
                items: vec![json!({"head": "Welcome", "link": "messages.php?action=viewmessage&id=9"})],
                domain: "https://site.example/".to_string(),
                request_url: "https://site.example/messages.php".to_string(),
                next_page: "messages.php?action=viewmailbox&page=1".to_string(),
            },
        );
        engine.push_data(
            "unread_message_detail|https://site.example/messages.php?action=viewmessage&id=9",
            json!({"content": "hello"}),
        );

        let messages = client.unread_messages(true).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_latest_notice_with_empty_title_is_absent() {
        let (client, engine) = client();
        engine.push_data("latest_notice", json!({"title": "", "content": "placeholder"}));
        engine.push_data("latest_notice", json!({"title": "Maintenance", "date": 1700000000}));

        assert_eq!(client.latest_notice().await.unwrap(), None);
        let notice = client.latest_notice().await.unwrap().unwrap();
        assert_eq!(notice.title, "Maintenance");
        assert_eq!(notice.date, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_rss_fetches_site_feed() {
        let (client, engine) = client();
        engine.push_raw(
            RSS_URL,
            r#"<?xml version="1.0"?>
            <rss version="2.0"><channel><title>Example</title>
              <item>
                <title>Dune</title>
                <link>https://site.example/details.php?id=1</link>
                <enclosure url="https://site.example/download.php?id=1" length="1024" type="application/x-bittorrent"/>
                <guid>1</guid>
              </item>
            </channel></rss>"#,
        );

        let torrents = client.rss().await.unwrap();
        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].enclosure, "https://site.example/download.php?id=1");
        assert_eq!(torrents[0].size, 1024);

        let call = &engine.calls_for(RSS_URL)[0];
        assert!(call.request.definition.is_some());
    }

    #[tokio::test]
    async fn test_sign_in_needs_login() {
        let (client, engine) = client();
        engine.push_data("user_basic_info", json!({"is_login": false}));

        let result = client.sign_in().await.unwrap();
        assert_eq!(result.code, SignInCode::NeedLogin);
        assert!(engine.calls_for("sign_in").is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_already_signed() {
        let (client, engine) = client();
        engine.push_data("user_basic_info", json!({"is_login": true, "signed_in": true}));

        let result = client.sign_in().await.unwrap();
        assert_eq!(result.code, SignInCode::AlreadySigned);
        assert_eq!(result.message, "今日已签到");
    }

    #[tokio::test]
    async fn test_sign_in_simulated_when_not_required() {
        let (client, engine) = client();
        engine.push_data("user_basic_info", json!({"is_login": true}));

        let result = client.sign_in().await.unwrap();
        assert_eq!(result.code, SignInCode::Success);
        assert_eq!(result.message, "模拟登录成功");
        assert!(engine.calls_for("sign_in").is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_request_outcomes() {
        let (client, engine) = client_with(SiteConfig {
            required: RequiredConfig { sign_in: true },
            ..Default::default()
        });
        for _ in 0..3 {
            engine.push_data("user_basic_info", json!({"is_login": true}));
        }
        engine.push_data_response("sign_in", status_response(json!({"signed_in": true}), 200));
        engine.push_data_response("sign_in", status_response(json!({}), 200));
        engine.push_data_response("sign_in", status_response(json!({}), 302));

        let signed = client.sign_in().await.unwrap();
        assert_eq!(signed, SignInResult::new(SignInCode::Success, "签到成功"));

        let unadapted = client.sign_in().await.unwrap();
        assert_eq!(unadapted.code, SignInCode::Failure);
        assert_eq!(unadapted.message, "签到失败，请检查该站点是否已适配");

        let rejected = client.sign_in().await.unwrap();
        assert_eq!(rejected.code, SignInCode::Failure);
        assert_eq!(rejected.message, "签到失败，状态码：302");
    }

    #[tokio::test]
    async fn test_download_url_is_enclosure() {
        let (client, engine) = client();
        let torrent = SearchTorrent {
            enclosure: "https://site.example/download.php?id=1".to_string(),
            ..Default::default()
        };

        assert_eq!(
            client.download_url(&torrent).await.unwrap(),
            "https://site.example/download.php?id=1"
        );
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_details_passes_torrent_id() {
        let (client, engine) = client();
        engine.push_data("details", json!({"free": true, "2x_free": "1", "peer_count": 12}));

        let detail = client.details("77").await.unwrap();
        assert!(detail.free);
        assert!(detail.double_free);
        assert_eq!(detail.peer_count, 12);

        let call = &engine.calls_for("details")[0];
        assert_eq!(call.request.env.get("id").map(String::as_str), Some("77"));
    }

    #[tokio::test]
    async fn test_engine_errors_carry_site_and_operation() {
        let (client, engine) = client();
        engine.push_error(
            "details",
            EngineError::Transport {
                reason: "connection reset".to_string(),
            },
        );

        let err = client.details("1").await.unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("站点(Example)获取详情异常, 异常: "));
        assert!(text.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let engine = Arc::new(ScriptedEngine::new());
        let ctx = SiteContext::new(
            Arc::new(site()),
            Arc::new(SiteConfigRegistry::new()),
            engine,
            ClientSettings::for_testing(),
        );
        let client = NexusPhpClient::new(ctx);

        let err = client.my_hr().await.unwrap_err();
        assert!(err.is_config_error());
    }
}
