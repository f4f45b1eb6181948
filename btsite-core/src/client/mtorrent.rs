//! Client for JSON-API trackers of the M-Team family.
//!
//! Reuses [`NexusPhpClient`] for the favicon, notice, RSS, download link and
//! torrent detail operations, and overrides everything whose API differs.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{Client, NexusPhpClient, sign_in_precheck, simulated_sign_in};
use crate::context::SiteContext;
use crate::errors::SiteError;
use crate::lenient::{de_f64, de_i64, de_string, de_timestamp, de_u32};
use crate::pagination::{Page, PageWalker};
use crate::request::{RequestId, RequestParams};
use crate::types::{
    HrTorrent, MarkAsReadOutcome, MediaType, Message, Notice, RssTorrent, SearchParams,
    SearchTorrent, SeedingStatistics, SignInResult, Site, TorrentDetail, TorrentRow,
    UserBasicInfo, UserDetails,
};
use crate::url::join_url;

/// Peers of the account across all torrents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PeerStatus {
    #[serde(deserialize_with = "de_u32")]
    pub leecher: u32,
    #[serde(deserialize_with = "de_u32")]
    pub seeder: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct MsgNotifyStatistic {
    /// Unread messages; the total `count` is not needed
    #[serde(deserialize_with = "de_u32")]
    un_make: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Profile {
    #[serde(deserialize_with = "de_timestamp")]
    created_date: i64,
    #[serde(deserialize_with = "de_timestamp")]
    last_modified_date: i64,
    #[serde(deserialize_with = "de_string")]
    username: String,
    #[serde(deserialize_with = "de_i64")]
    uploaded: i64,
    #[serde(deserialize_with = "de_i64")]
    downloaded: i64,
    #[serde(deserialize_with = "de_f64")]
    share_rate: f64,
    #[serde(deserialize_with = "de_f64")]
    bonus: f64,
    #[serde(deserialize_with = "de_string")]
    role: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct UserTorrent {
    #[serde(deserialize_with = "de_i64")]
    size: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SysRole {
    #[serde(deserialize_with = "de_string")]
    id: String,
    #[serde(deserialize_with = "de_string")]
    name_chs: String,
    #[serde(deserialize_with = "de_string")]
    name_eng: String,
}

/// Search mode understood by the torrent search API.
fn search_mode(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Tv => "tvshow",
        MediaType::Anime => "normal",
        MediaType::Movie | MediaType::Other => "movie",
    }
}

/// Flattens `|`-delimited label groups into single labels.
fn split_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .flat_map(|group| group.split('|'))
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct MTorrentClient {
    ctx: SiteContext,
    base: NexusPhpClient,
}

impl MTorrentClient {
    pub fn new(ctx: SiteContext) -> Self {
        let base = NexusPhpClient::new(ctx.clone());
        Self { ctx, base }
    }

    /// Seeding and leeching peer counts of the account.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The fetch failed
    pub async fn peer_status(&self) -> Result<PeerStatus, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<PeerStatus>(RequestParams::named(RequestId::MyPeerStatus), "做种信息异常")
            .await?;
        Ok(fetched.value)
    }

    /// Requests a tokenised download link for a search result.
    ///
    /// Search results of this architecture carry no enclosure; the site
    /// issues short-lived download links on demand instead.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The fetch failed or returned no link
    pub async fn download_token_url(&self, torrent: &SearchTorrent) -> Result<String, SiteError> {
        const OPERATION: &str = "获取下载链接异常";
        let fetched = self
            .ctx
            .fetch_data::<Map<String, Value>>(
                RequestParams::named(RequestId::GenDlToken).env_var("id", torrent.id.clone()),
                OPERATION,
            )
            .await?;

        match fetched.value.get("url") {
            Some(Value::String(url)) => Ok(url.clone()),
            _ => Err(self.ctx.fail(
                OPERATION,
                SiteError::Decode {
                    reason: "response has no download url".to_string(),
                },
            )),
        }
    }

    async fn profile(&self) -> Result<Profile, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<Profile>(RequestParams::named(RequestId::Profile), "个人资料异常")
            .await?;
        Ok(fetched.value)
    }

    async fn msg_notify_statistic(&self) -> Result<MsgNotifyStatistic, SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<MsgNotifyStatistic>(
                RequestParams::named(RequestId::MsgNotifyStatistic),
                "消息通知统计异常",
            )
            .await?;
        Ok(fetched.value)
    }

    async fn sys_role_list(&self) -> Result<Vec<SysRole>, SiteError> {
        let listed = self
            .ctx
            .fetch_list::<SysRole>(RequestParams::named(RequestId::SysRoleList), "角色列表异常")
            .await?;
        Ok(listed.items)
    }

    async fn user_torrent_page(&self, page_number: u32) -> Result<Page<i64, u32>, SiteError> {
        let mut body = Map::new();
        body.insert("userid".to_string(), json!(self.ctx.site().user_id));
        body.insert("type".to_string(), json!("SEEDING"));
        body.insert("pageNumber".to_string(), json!(page_number));
        body.insert("pageSize".to_string(), json!(self.ctx.settings().api_page_size));

        let listed = self
            .ctx
            .fetch_list::<UserTorrent>(
                RequestParams::named(RequestId::UserTorrentList).with_body(body),
                "用户做种列表异常",
            )
            .await?;
        let sizes = listed.items.into_iter().map(|torrent| torrent.size).collect();
        Ok(Page::numbered(sizes, page_number))
    }

    async fn mark_as_read(&self, ids: &[String]) -> Result<(), SiteError> {
        let fetched = self
            .ctx
            .fetch_data::<MarkAsReadOutcome>(
                RequestParams::named(RequestId::MarkAsRead).env_var("ids", ids.join(",")),
                "未读消息设为已读异常",
            )
            .await?;

        let outcome = fetched.value;
        if outcome.success {
            return Ok(());
        }
        Err(self.ctx.fail(
            "未读消息设为已读异常",
            SiteError::MarkAsRead {
                message: outcome.message,
            },
        ))
    }
}

#[async_trait]
impl Client for MTorrentClient {
    fn site(&self) -> &Site {
        self.ctx.site()
    }

    async fn favicon(&self) -> Result<Bytes, SiteError> {
        self.base.favicon().await
    }

    async fn user_basic_info(&self) -> Result<UserBasicInfo, SiteError> {
        let profile = self.profile().await?;
        let messages = self.msg_notify_statistic().await?;

        Ok(UserBasicInfo {
            is_login: !profile.username.is_empty(),
            signed_in: false,
            id: self.ctx.site().user_id.clone(),
            name: profile.username,
            unread_message_count: messages.un_make,
            ratio: profile.share_rate,
            uploaded: profile.uploaded,
            downloaded: profile.downloaded,
            bonus: profile.bonus,
        })
    }

    async fn user_details(&self) -> Result<UserDetails, SiteError> {
        let profile = self.profile().await?;
        let roles = self.sys_role_list().await?;

        let level = roles
            .iter()
            .find(|role| role.id == profile.role)
            .map(|role| format!("{} {}", role.name_chs, role.name_eng))
            .unwrap_or_default();

        Ok(UserDetails {
            level,
            join_at: profile.created_date,
            last_accessed: profile.last_modified_date,
        })
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchTorrent>, SiteError> {
        let mut body = Map::new();
        body.insert("mode".to_string(), json!(search_mode(params.media_type)));
        body.insert("visible".to_string(), json!(1));
        body.insert("pageNumber".to_string(), json!(params.page.saturating_add(1)));
        body.insert("pageSize".to_string(), json!(self.ctx.settings().api_page_size));
        if !params.keyword.is_empty() {
            body.insert("keyword".to_string(), json!(params.keyword));
        }

        let listed = self
            .ctx
            .fetch_list::<TorrentRow>(
                RequestParams::named(RequestId::Search).with_body(body),
                "搜索异常",
            )
            .await?;

        let domain = listed.domain;
        listed
            .items
            .into_iter()
            .map(|mut row| -> Result<SearchTorrent, SiteError> {
                let page_url =
                    join_url(&domain, &row.details).map_err(|e| self.ctx.fail("搜索异常", e))?;
                let labels = split_labels(&std::mem::take(&mut row.labels));
                Ok(row.into_search_torrent(page_url, String::new(), labels))
            })
            .collect()
    }

    async fn seeding_statistics(&self) -> Result<SeedingStatistics, SiteError> {
        let stats = PageWalker::from_settings(self.ctx.settings())
            .fold(
                1u32,
                SeedingStatistics::default(),
                |page_number| async move { self.user_torrent_page(page_number).await },
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
        Ok(Vec::new())
    }

    async fn unread_messages(&self, detail: bool) -> Result<Vec<Message>, SiteError> {
        let listed = self
            .ctx
            .fetch_list::<Message>(
                RequestParams::named(RequestId::UnreadMessages).env_var("pageNumber", "1"),
                "获取未读消息异常",
            )
            .await?;
        if !detail {
            return Ok(listed.items);
        }

        let ids: Vec<String> = listed.items.into_iter().map(|message| message.id).collect();
        self.mark_as_read(&ids).await?;
        tracing::debug!(
            "Marked {} messages as read on {}",
            ids.len(),
            self.ctx.site().code
        );
        Ok(Vec::new())
    }

    async fn latest_notice(&self) -> Result<Option<Notice>, SiteError> {
        self.base.latest_notice().await
    }

    async fn rss(&self) -> Result<Vec<RssTorrent>, SiteError> {
        self.base.rss().await
    }

    async fn sign_in(&self) -> Result<SignInResult, SiteError> {
        let info = self.user_basic_info().await?;
        Ok(sign_in_precheck(&info).unwrap_or_else(simulated_sign_in))
    }

    async fn download_url(&self, torrent: &SearchTorrent) -> Result<String, SiteError> {
        self.base.download_url(torrent).await
    }

    async fn details(&self, id: &str) -> Result<TorrentDetail, SiteError> {
        self.base.details(id).await
    }
}
