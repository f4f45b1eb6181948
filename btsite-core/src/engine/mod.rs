//! Boundary to the site adaptation engine.
//!
//! The engine turns a [`SiteRequest`] plus a site's declarative configuration
//! into an HTTP exchange and extracts structured output from the response.
//! Clients treat it as a black box reached through three operations.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::request::SiteRequest;

#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{RecordedCall, ScriptedEngine};

/// Errors reported by the site adaptation engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The HTTP exchange failed.
    #[error("Transport error: {reason}")]
    Transport {
        /// The reason for the transport failure
        reason: String,
    },

    /// The response did not match the extraction rules.
    #[error("Parse error: {reason}")]
    Parse {
        /// The reason for the parse failure
        reason: String,
    },

    /// The request descriptor could not be turned into an HTTP call.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// The reason the request is invalid
        reason: String,
    },

    /// The site configuration does not declare the named request.
    #[error("Unknown request: {id}")]
    UnknownRequest {
        /// The request id that was not found
        id: String,
    },
}

/// Output of a single-object fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataResponse {
    /// Extracted object (or array, for table-shaped pages)
    pub value: Value,
    /// Fully resolved URL the request was sent to
    pub request_url: String,
    /// HTTP status code of the response
    pub status: u16,
}

/// Output of a list fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListResponse {
    pub items: Vec<Value>,
    /// Domain the response was served from
    pub domain: String,
    pub request_url: String,
    /// Cursor of the following page; empty when the listing is exhausted
    pub next_page: String,
}

/// Output of a raw fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub data: Bytes,
    pub domain: String,
}

/// Site adaptation engine executing declarative site requests.
///
/// Implementations resolve the request (named id, ad-hoc definition or path)
/// against `config`, perform the HTTP call and apply extraction rules.
#[async_trait]
pub trait SiteEngine: Send + Sync + std::fmt::Debug {
    /// Fetches and extracts a single object.
    ///
    /// # Errors
    /// - `EngineError::Transport` - Network failure
    /// - `EngineError::Parse` - Response did not match extraction rules
    /// - `EngineError::UnknownRequest` - Named request is not declared
    async fn fetch_one(
        &self,
        config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<DataResponse, EngineError>;

    /// Fetches and extracts a list, reporting the next-page cursor.
    ///
    /// # Errors
    /// - `EngineError::Transport` - Network failure
    /// - `EngineError::Parse` - Response did not match extraction rules
    /// - `EngineError::UnknownRequest` - Named request is not declared
    async fn fetch_list(
        &self,
        config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<ListResponse, EngineError>;

    /// Fetches the raw response body.
    ///
    /// # Errors
    /// - `EngineError::Transport` - Network failure
    /// - `EngineError::InvalidRequest` - Request cannot be executed
    async fn fetch_raw(
        &self,
        config: &SiteConfig,
        request: &SiteRequest,
    ) -> Result<RawResponse, EngineError>;
}
