//! Request descriptors handed to the site engine.
//!
//! [`RequestParams`] collects what an operation wants to send; [`RequestParams::build`]
//! merges it with the site identity into a normalized [`SiteRequest`]. When
//! several targets are supplied the engine honours them in the order
//! named request > ad-hoc definition > bare path, with the path overriding the
//! chosen definition's own path.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::config::RequestDefinition;
use crate::types::Site;

/// Ordered query or form parameters; keys may repeat.
pub type Pairs = Vec<(String, String)>;

/// Named requests declared in site configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestId {
    Favicon,
    UserBasicInfo,
    UserDetails,
    Search,
    SeedingStatistics,
    MyHr,
    UnreadMessages,
    UnreadMessageDetail,
    MarkAsRead,
    LatestNotice,
    SignIn,
    Details,
    MyPeerStatus,
    MsgNotifyStatistic,
    Profile,
    UserTorrentList,
    SysRoleList,
    GenDlToken,
}

impl RequestId {
    /// Identifier used as key in `request_definitions`.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestId::Favicon => "favicon",
            RequestId::UserBasicInfo => "user_basic_info",
            RequestId::UserDetails => "user_details",
            RequestId::Search => "search",
            RequestId::SeedingStatistics => "seeding_statistics",
            RequestId::MyHr => "my_hr",
            RequestId::UnreadMessages => "unread_messages",
            RequestId::UnreadMessageDetail => "unread_message_detail",
            RequestId::MarkAsRead => "mark_as_read",
            RequestId::LatestNotice => "latest_notice",
            RequestId::SignIn => "sign_in",
            RequestId::Details => "details",
            RequestId::MyPeerStatus => "my_peer_status",
            RequestId::MsgNotifyStatistic => "msg_notify_statistic",
            RequestId::Profile => "profile",
            RequestId::UserTorrentList => "user_torrent_list",
            RequestId::SysRoleList => "sys_role_list",
            RequestId::GenDlToken => "gen_dl_token",
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized request descriptor consumed by [`crate::engine::SiteEngine`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteRequest {
    pub request_id: Option<String>,
    pub definition: Option<RequestDefinition>,
    /// Replaces the resolved definition's path, or stands alone
    pub path: Option<String>,
    pub domain: String,
    pub api: String,
    pub params: Pairs,
    pub form_data: Pairs,
    /// Template variables; always carries `userId` and `api`
    pub env: HashMap<String, String>,
    pub body: Option<Map<String, Value>>,
    pub user_agent: String,
    pub cookie: String,
    pub headers: HashMap<String, String>,
}

/// What a [`SiteRequest`] points at, after applying override priority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestTarget<'a> {
    Named {
        id: &'a str,
        path: Option<&'a str>,
    },
    AdHoc {
        definition: &'a RequestDefinition,
        path: Option<&'a str>,
    },
    Path(&'a str),
    Missing,
}

impl SiteRequest {
    /// Resolves which request shape the engine should use.
    pub fn target(&self) -> RequestTarget<'_> {
        let path = self.path.as_deref().filter(|p| !p.is_empty());
        if let Some(id) = self.request_id.as_deref().filter(|id| !id.is_empty()) {
            return RequestTarget::Named { id, path };
        }
        if let Some(definition) = &self.definition {
            return RequestTarget::AdHoc { definition, path };
        }
        match path {
            Some(path) => RequestTarget::Path(path),
            None => RequestTarget::Missing,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self.target() {
            RequestTarget::Named { id, path: Some(path) } => format!("{id} ({path})"),
            RequestTarget::Named { id, path: None } => id.to_string(),
            RequestTarget::AdHoc { definition, .. } => {
                format!("{} {}", definition.method, definition.path)
            }
            RequestTarget::Path(path) => path.to_string(),
            RequestTarget::Missing => "<no target>".to_string(),
        }
    }
}

/// Per-call request parameters supplied by a client operation.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    request_id: Option<RequestId>,
    definition: Option<RequestDefinition>,
    path: Option<String>,
    params: Pairs,
    form_data: Pairs,
    env: Option<HashMap<String, String>>,
    body: Option<Map<String, Value>>,
}

impl RequestParams {
    /// Targets a named request declared in the site configuration.
    pub fn named(id: RequestId) -> Self {
        Self {
            request_id: Some(id),
            ..Default::default()
        }
    }

    /// Targets an inline request definition.
    pub fn ad_hoc(definition: RequestDefinition) -> Self {
        Self {
            definition: Some(definition),
            ..Default::default()
        }
    }

    /// Overrides the target path, e.g. to follow a next-page cursor.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.path = (!path.is_empty()).then_some(path);
        self
    }

    pub fn with_params(mut self, params: Pairs) -> Self {
        self.params = params;
        self
    }

    pub fn with_form_data(mut self, form_data: Pairs) -> Self {
        self.form_data = form_data;
        self
    }

    /// Adds a template variable.
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }

    /// Merges the parameters with the site identity.
    ///
    /// Injects `userId` and `api` into the environment unconditionally and
    /// `domain` when the site declares one; parses the site's header block.
    pub fn build(self, site: &Site) -> SiteRequest {
        let mut env = self.env.unwrap_or_default();
        env.insert("userId".to_string(), site.user_id.clone());
        env.insert("api".to_string(), site.api.clone());
        if !site.domain.is_empty() {
            env.insert("domain".to_string(), site.domain.clone());
        }

        SiteRequest {
            request_id: self.request_id.map(|id| id.as_str().to_string()),
            definition: self.definition,
            path: self.path,
            domain: site.domain.clone(),
            api: site.api.clone(),
            params: self.params,
            form_data: self.form_data,
            env,
            body: self.body,
            user_agent: site.user_agent.clone(),
            cookie: site.cookie.clone(),
            headers: parse_headers(&site.headers),
        }
    }
}

/// Parses a `Key: Value` header block.
///
/// Lines are trimmed and split on `:`; a line that does not yield exactly
/// two parts is dropped. Values keep their leading whitespace.
pub fn parse_headers(raw: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for line in raw.split('\n') {
        let line = line.trim();
        let parts: Vec<&str> = line.split(':').collect();
        if let [key, value] = parts.as_slice() {
            headers.insert((*key).to_string(), (*value).to_string());
        } else if !line.is_empty() {
            tracing::warn!("Dropping malformed header line: {}", line);
        }
    }
    headers
}
