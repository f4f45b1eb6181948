//! Shared state of a site client and the fetch helpers built on it.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::{ClientSettings, SiteConfig, SiteConfigSource};
use crate::engine::{RawResponse, SiteEngine};
use crate::errors::SiteError;
use crate::request::{RequestParams, SiteRequest};
use crate::types::Site;

/// Everything a client needs to talk to one site.
#[derive(Debug, Clone)]
pub struct SiteContext {
    site: Arc<Site>,
    configs: Arc<dyn SiteConfigSource>,
    engine: Arc<dyn SiteEngine>,
    settings: ClientSettings,
}

/// A decoded single-object fetch.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub request_url: String,
    pub status: u16,
}

/// A decoded list fetch.
#[derive(Debug, Clone)]
pub struct Listed<T> {
    pub items: Vec<T>,
    pub domain: String,
    pub request_url: String,
    pub next_page: String,
}

/// A descriptor paired with the engine and configuration that will run it.
#[derive(Debug)]
pub struct PreparedRequest {
    engine: Arc<dyn SiteEngine>,
    config: Arc<SiteConfig>,
    request: SiteRequest,
}

impl SiteContext {
    pub fn new(
        site: Arc<Site>,
        configs: Arc<dyn SiteConfigSource>,
        engine: Arc<dyn SiteEngine>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            site,
            configs,
            engine,
            settings,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Looks up the site's configuration; never cached.
    ///
    /// # Errors
    /// - `SiteError::ConfigNotFound` - The site code is not registered
    pub fn config(&self) -> Result<Arc<SiteConfig>, SiteError> {
        self.configs.config_by_code(&self.site.code)
    }

    /// Builds the request descriptor and pairs it with the engine.
    ///
    /// # Errors
    /// - `SiteError::ConfigNotFound` - The site code is not registered
    pub fn prepare(&self, params: RequestParams) -> Result<PreparedRequest, SiteError> {
        Ok(PreparedRequest {
            engine: Arc::clone(&self.engine),
            config: self.config()?,
            request: params.build(&self.site),
        })
    }

    /// Wraps `error` with the site name and a short operation label.
    pub fn fail(&self, operation: &str, error: impl Into<SiteError>) -> SiteError {
        SiteError::operation(&self.site.name, operation, error)
    }

    /// Looks up the configuration, labelling failures with `operation`.
    ///
    /// # Errors
    /// - `SiteError::Operation` - The site code is not registered
    pub fn config_for(&self, operation: &str) -> Result<Arc<SiteConfig>, SiteError> {
        self.config().map_err(|e| self.fail(operation, e))
    }

    /// Prepares and runs a single-object fetch.
    ///
    /// # Errors
    /// - `SiteError::Operation` - Preparation, the engine call or decoding failed
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        params: RequestParams,
        operation: &str,
    ) -> Result<Fetched<T>, SiteError> {
        let prepared = self.prepare(params).map_err(|e| self.fail(operation, e))?;
        prepared.data().await.map_err(|e| self.fail(operation, e))
    }

    /// Prepares and runs a list fetch.
    ///
    /// # Errors
    /// - `SiteError::Operation` - Preparation, the engine call or decoding failed
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        params: RequestParams,
        operation: &str,
    ) -> Result<Listed<T>, SiteError> {
        let prepared = self.prepare(params).map_err(|e| self.fail(operation, e))?;
        prepared.list().await.map_err(|e| self.fail(operation, e))
    }

    /// Prepares and runs a raw fetch.
    ///
    /// # Errors
    /// - `SiteError::Operation` - Preparation or the engine call failed
    pub async fn fetch_raw(
        &self,
        params: RequestParams,
        operation: &str,
    ) -> Result<RawResponse, SiteError> {
        let prepared = self.prepare(params).map_err(|e| self.fail(operation, e))?;
        prepared.raw().await.map_err(|e| self.fail(operation, e))
    }
}

impl PreparedRequest {
    pub fn request(&self) -> &SiteRequest {
        &self.request
    }

    /// Fetches one object and decodes it.
    ///
    /// # Errors
    /// - `SiteError::Engine` - The engine call failed
    /// - `SiteError::Decode` - The output does not match `T`
    pub async fn data<T: DeserializeOwned>(&self) -> Result<Fetched<T>, SiteError> {
        tracing::debug!("Fetching object {}", self.request.describe());
        let response = self.engine.fetch_one(&self.config, &self.request).await?;
        Ok(Fetched {
            value: serde_json::from_value(response.value)?,
            request_url: response.request_url,
            status: response.status,
        })
    }

    /// Fetches a list and decodes every item.
    ///
    /// # Errors
    /// - `SiteError::Engine` - The engine call failed
    /// - `SiteError::Decode` - An item does not match `T`
    pub async fn list<T: DeserializeOwned>(&self) -> Result<Listed<T>, SiteError> {
        tracing::debug!("Fetching list {}", self.request.describe());
        let response = self.engine.fetch_list(&self.config, &self.request).await?;
        let items = response
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Listed {
            items,
            domain: response.domain,
            request_url: response.request_url,
            next_page: response.next_page,
        })
    }

    /// Fetches the raw response body.
    ///
    /// # Errors
    /// - `SiteError::Engine` - The engine call failed
    pub async fn raw(&self) -> Result<RawResponse, SiteError> {
        tracing::debug!("Fetching raw {}", self.request.describe());
        Ok(self.engine.fetch_raw(&self.config, &self.request).await?)
    }
}
