//! Data types shared by every site architecture.

use serde::{Deserialize, Serialize};

use crate::lenient::{de_bool, de_f64, de_i64, de_string, de_u32};

/// Identity and transport settings of one tracker site account.
///
/// Owned by the caller and read-only to clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Site {
    /// Unique site code, used to look up the site's configuration
    pub code: String,
    /// Display name used in error messages
    pub name: String,
    pub user_id: String,
    /// API base URL for API-style sites
    pub api: String,
    pub domain: String,
    pub user_agent: String,
    pub cookie: String,
    /// Extra request headers, one `Key: Value` pair per line
    pub headers: String,
    pub rss_url: String,
}

/// Requested media category for a search.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
    Anime,
    Other,
}

impl MediaType {
    /// Stable code used in configuration and logs.
    pub fn code(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Anime => "anime",
            MediaType::Other => "other",
        }
    }
}

/// Search request parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    pub keyword: String,
    pub media_type: MediaType,
    /// Zero-based page index
    pub page: u32,
}

impl SearchParams {
    /// Creates search parameters for the first page.
    pub fn new(keyword: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            keyword: keyword.into(),
            media_type,
            page: 0,
        }
    }

    /// Sets the zero-based page index.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}

/// Account summary, usually available from the site's landing page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserBasicInfo {
    pub is_login: bool,
    /// Whether today's sign-in has already happened
    pub signed_in: bool,
    pub id: String,
    pub name: String,
    pub unread_message_count: u32,
    pub ratio: f64,
    /// Uploaded volume in bytes
    pub uploaded: i64,
    /// Downloaded volume in bytes
    pub downloaded: i64,
    pub bonus: f64,
}

/// Account details, usually available from the profile page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserDetails {
    #[serde(deserialize_with = "de_string")]
    pub level: String,
    /// Registration time as a Unix timestamp
    #[serde(deserialize_with = "de_i64")]
    pub join_at: i64,
    /// Last access time as a Unix timestamp
    #[serde(deserialize_with = "de_i64")]
    pub last_accessed: i64,
}

/// A torrent found by [`crate::Client::search`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchTorrent {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    /// Absolute URL of the torrent's detail page
    pub page_url: String,
    /// Absolute download URL or magnet URI
    pub enclosure: String,
    pub grabs: u32,
    pub seeders: u32,
    pub leechers: u32,
    /// Size in bytes
    pub size: i64,
    pub download_volume_factor: f64,
    pub upload_volume_factor: f64,
    pub pub_date: String,
    pub date_elapsed: String,
    pub hr_days: u32,
    pub hit_and_run: bool,
    pub labels: Vec<String>,
}

/// Totals over every torrent the account is seeding.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeedingStatistics {
    #[serde(deserialize_with = "de_u32")]
    pub count: u32,
    /// Total size in bytes
    #[serde(deserialize_with = "de_i64")]
    pub size: i64,
}

/// A torrent under hit-and-run review.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HrTorrent {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_string")]
    pub name: String,
    #[serde(deserialize_with = "de_string")]
    pub uploaded: String,
    #[serde(deserialize_with = "de_string")]
    pub downloaded: String,
    #[serde(deserialize_with = "de_string")]
    pub share_ratio: String,
    #[serde(deserialize_with = "de_string")]
    pub download_time: String,
    #[serde(deserialize_with = "de_string")]
    pub need_seed_time: String,
    #[serde(deserialize_with = "de_string")]
    pub remaining_inspection_time: String,
}

/// An unread site message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Message {
    /// Message id, only reported by API-style sites
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_string")]
    pub head: String,
    #[serde(deserialize_with = "de_string")]
    pub date: String,
    #[serde(deserialize_with = "de_string")]
    pub content: String,
    /// Link to the message detail page, possibly relative
    #[serde(deserialize_with = "de_string")]
    pub link: String,
}

/// A site announcement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Notice {
    #[serde(deserialize_with = "de_string")]
    pub title: String,
    /// Publication time as a Unix timestamp
    #[serde(deserialize_with = "de_i64")]
    pub date: i64,
    #[serde(deserialize_with = "de_string")]
    pub content: String,
}

/// A torrent pulled from the site's RSS feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RssTorrent {
    pub id: String,
    pub title: String,
    /// Download URL
    pub enclosure: String,
    /// Size in bytes
    pub size: i64,
    pub description: String,
    /// Detail page URL
    pub link: String,
    /// Publication time as a Unix timestamp
    pub pub_date: i64,
}

/// Promotion and health flags of a single torrent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TorrentDetail {
    /// The torrent no longer exists on the site
    #[serde(deserialize_with = "de_bool")]
    pub absent: bool,
    #[serde(deserialize_with = "de_bool")]
    pub free: bool,
    #[serde(rename = "2x_free", deserialize_with = "de_bool")]
    pub double_free: bool,
    #[serde(deserialize_with = "de_bool")]
    pub hr: bool,
    #[serde(deserialize_with = "de_u32")]
    pub peer_count: u32,
}

/// Classification of a single sign-in attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SignInCode {
    NeedLogin,
    AlreadySigned,
    Success,
    Failure,
}

/// Outcome of [`crate::Client::sign_in`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignInResult {
    pub code: SignInCode,
    pub message: String,
}

impl SignInResult {
    pub(crate) fn new(code: SignInCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// Engine output shared by both architectures; never returned to callers.

/// Raw torrent row as extracted from a search listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TorrentRow {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_string")]
    pub category: String,
    #[serde(deserialize_with = "de_string")]
    pub title: String,
    #[serde(deserialize_with = "de_string")]
    pub details: String,
    #[serde(deserialize_with = "de_string")]
    pub download: String,
    #[serde(deserialize_with = "de_i64")]
    pub size: i64,
    #[serde(deserialize_with = "de_u32")]
    pub grabs: u32,
    #[serde(deserialize_with = "de_u32")]
    pub seeders: u32,
    #[serde(deserialize_with = "de_u32")]
    pub leechers: u32,
    #[serde(deserialize_with = "de_string")]
    pub date_elapsed: String,
    #[serde(deserialize_with = "de_string")]
    pub date_added: String,
    #[serde(rename = "downloadvolumefactor", deserialize_with = "de_f64")]
    pub download_volume_factor: f64,
    #[serde(rename = "uploadvolumefactor", deserialize_with = "de_f64")]
    pub upload_volume_factor: f64,
    #[serde(deserialize_with = "de_string")]
    pub description: String,
    #[serde(deserialize_with = "crate::lenient::de_strings")]
    pub labels: Vec<String>,
    #[serde(deserialize_with = "de_u32")]
    pub hr_days: u32,
}

impl TorrentRow {
    /// Maps the row onto a search result with already-resolved links.
    pub fn into_search_torrent(
        self,
        page_url: String,
        enclosure: String,
        labels: Vec<String>,
    ) -> SearchTorrent {
        SearchTorrent {
            id: self.id,
            category: self.category,
            title: self.title,
            description: self.description,
            page_url,
            enclosure,
            grabs: self.grabs,
            seeders: self.seeders,
            leechers: self.leechers,
            size: self.size,
            download_volume_factor: self.download_volume_factor,
            upload_volume_factor: self.upload_volume_factor,
            pub_date: self.date_added,
            date_elapsed: self.date_elapsed,
            hr_days: self.hr_days,
            hit_and_run: self.hr_days > 0,
            labels,
        }
    }
}

/// Result of a mark-as-read request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MarkAsReadOutcome {
    #[serde(deserialize_with = "de_bool")]
    pub success: bool,
    #[serde(deserialize_with = "de_string")]
    pub message: String,
}
