//! btsite - Uniform clients for private BitTorrent tracker sites
//!
//! Every supported tracker is driven through the same [`Client`] surface:
//! account summary, search, seeding totals, hit-and-run reviews, messages,
//! notices, RSS and sign-in. A [`ClientFactory`] picks the implementation
//! from the architecture declared in the site's [`SiteConfig`], and each
//! implementation phrases its operations as declarative requests for an
//! external [`SiteEngine`] to execute.

pub mod client;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod lenient;
pub mod pagination;
pub mod request;
pub mod rss;
pub mod types;
pub mod url;

// Re-export main types for convenient access
pub use client::{Client, ClientConstructor, ClientFactory, MTorrentClient, NexusPhpClient, PeerStatus};
pub use config::{
    ClientSettings, SCHEMA_MTORRENT, SCHEMA_NEXUS_PHP, SiteConfig, SiteConfigRegistry,
    SiteConfigSource,
};
pub use context::SiteContext;
pub use engine::{DataResponse, EngineError, ListResponse, RawResponse, SiteEngine};
pub use errors::SiteError;
pub use request::{RequestId, RequestParams, SiteRequest};
pub use types::{
    HrTorrent, MediaType, Message, Notice, RssTorrent, SearchParams, SearchTorrent,
    SeedingStatistics, SignInCode, SignInResult, Site, TorrentDetail, UserBasicInfo, UserDetails,
};
pub use crate::url::join_url;

#[cfg(any(test, feature = "test-utils"))]
pub use engine::{RecordedCall, ScriptedEngine};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SiteError>;
