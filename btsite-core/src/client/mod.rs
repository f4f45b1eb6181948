//! Uniform client surface and architecture dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{ClientSettings, SCHEMA_MTORRENT, SCHEMA_NEXUS_PHP, SiteConfigSource};
use crate::context::SiteContext;
use crate::engine::SiteEngine;
use crate::errors::SiteError;
use crate::types::{
    HrTorrent, Message, Notice, RssTorrent, SearchParams, SearchTorrent, SeedingStatistics,
    SignInCode, SignInResult, Site, TorrentDetail, UserBasicInfo, UserDetails,
};

pub mod mtorrent;
pub mod nexusphp;

pub use mtorrent::{MTorrentClient, PeerStatus};
pub use nexusphp::NexusPhpClient;

/// Operations every tracker site client supports.
///
/// Each call performs its site round trips one after another and returns
/// once all of them completed or one failed.
#[async_trait]
pub trait Client: Send + Sync + std::fmt::Debug {
    /// The site this client talks to.
    fn site(&self) -> &Site;

    /// Downloads the site's favicon.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The engine call failed
    async fn favicon(&self) -> Result<Bytes, SiteError>;

    /// Account summary, usually available from the landing page.
    ///
    /// # Errors
    /// - `SiteError::Operation` - A fetch failed or returned undecodable data
    async fn user_basic_info(&self) -> Result<UserBasicInfo, SiteError>;

    /// Account details from the profile page.
    ///
    /// # Errors
    /// - `SiteError::Operation` - A fetch failed or returned undecodable data
    async fn user_details(&self) -> Result<UserDetails, SiteError>;

    /// Searches torrents; `params.page` is zero-based.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The search failed or a link could not be resolved
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchTorrent>, SiteError>;

    /// Count and total size of everything the account seeds.
    ///
    /// # Errors
    /// - `SiteError::Operation` - A page fetch failed
    /// - `SiteError::PaginationLimit` - The listing did not end within the page cap
    async fn seeding_statistics(&self) -> Result<SeedingStatistics, SiteError>;

    /// Torrents under hit-and-run review.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The fetch failed
    async fn my_hr(&self) -> Result<Vec<HrTorrent>, SiteError>;

    /// First page of unread messages; `detail` asks for message bodies.
    ///
    /// # Errors
    /// - `SiteError::Operation` - A fetch failed
    async fn unread_messages(&self, detail: bool) -> Result<Vec<Message>, SiteError>;

    /// Latest announcement, or `None` when the site shows none.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The fetch failed
    async fn latest_notice(&self) -> Result<Option<Notice>, SiteError>;

    /// Torrents from the account's RSS feed.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The feed could not be fetched or parsed
    async fn rss(&self) -> Result<Vec<RssTorrent>, SiteError>;

    /// Performs today's sign-in.
    ///
    /// # Errors
    /// - `SiteError::Operation` - A fetch failed; rejected sign-ins are
    ///   reported as [`SignInCode::Failure`] instead
    async fn sign_in(&self) -> Result<SignInResult, SiteError>;

    /// Download link for a search result.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The link could not be produced
    async fn download_url(&self, torrent: &SearchTorrent) -> Result<String, SiteError>;

    /// Promotion and health flags of a torrent.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The fetch failed
    async fn details(&self, id: &str) -> Result<TorrentDetail, SiteError>;
}

/// Early sign-in outcome derived from the account summary alone.
///
/// Returns `None` when the account is logged in and has not signed in today.
pub(crate) fn sign_in_precheck(info: &UserBasicInfo) -> Option<SignInResult> {
    if !info.is_login {
        return Some(SignInResult::new(SignInCode::NeedLogin, "未登录"));
    }
    if info.signed_in {
        return Some(SignInResult::new(SignInCode::AlreadySigned, "今日已签到"));
    }
    None
}

/// Outcome for sites where visiting the site counts as signing in.
pub(crate) fn simulated_sign_in() -> SignInResult {
    SignInResult::new(SignInCode::Success, "模拟登录成功")
}

/// Builds a client from a site context.
pub type ClientConstructor = fn(SiteContext) -> Box<dyn Client>;

fn nexus_php_client(ctx: SiteContext) -> Box<dyn Client> {
    Box::new(NexusPhpClient::new(ctx))
}

fn mtorrent_client(ctx: SiteContext) -> Box<dyn Client> {
    Box::new(MTorrentClient::new(ctx))
}

/// Creates clients by looking up each site's declared architecture.
///
/// The architecture table is fixed once the factory is built.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    configs: Arc<dyn SiteConfigSource>,
    engine: Arc<dyn SiteEngine>,
    settings: ClientSettings,
    constructors: HashMap<String, ClientConstructor>,
}

impl ClientFactory {
    /// Creates a factory knowing the built-in architectures.
    pub fn new(configs: Arc<dyn SiteConfigSource>, engine: Arc<dyn SiteEngine>) -> Self {
        let mut constructors: HashMap<String, ClientConstructor> = HashMap::new();
        constructors.insert(SCHEMA_NEXUS_PHP.to_string(), nexus_php_client);
        constructors.insert(SCHEMA_MTORRENT.to_string(), mtorrent_client);

        Self {
            configs,
            engine,
            settings: ClientSettings::default(),
            constructors,
        }
    }

    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Registers an additional architecture, replacing any existing one.
    pub fn with_architecture(mut self, schema: &str, constructor: ClientConstructor) -> Self {
        self.constructors.insert(schema.to_string(), constructor);
        self
    }

    /// Registered architecture identifiers, sorted.
    pub fn architectures(&self) -> Vec<&str> {
        let mut schemas: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        schemas.sort_unstable();
        schemas
    }

    /// Creates the client matching the site's declared architecture.
    ///
    /// # Errors
    /// - `SiteError::ConfigNotFound` - No configuration exists for `site.code`
    /// - `SiteError::InvalidSchema` - The declared architecture is unknown
    pub fn create(&self, site: Site) -> Result<Box<dyn Client>, SiteError> {
        let config = self.configs.config_by_code(&site.code)?;
        let constructor =
            self.constructors
                .get(&config.schema)
                .ok_or_else(|| SiteError::InvalidSchema {
                    schema: config.schema.clone(),
                })?;

        tracing::info!("Creating {} client for site {}", config.schema, site.code);
        let ctx = SiteContext::new(
            Arc::new(site),
            Arc::clone(&self.configs),
            Arc::clone(&self.engine),
            self.settings.clone(),
        );
        Ok(constructor(ctx))
    }
}
