//! Site configuration and client tunables.
//!
//! Site configurations are declarative documents describing a tracker's
//! architecture, named requests and capabilities. Clients look them up by
//! site code on every call, so edits made through [`SiteConfigRegistry`]
//! take effect on the next operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SiteError;

/// Declared site architecture of the template-driven forum-style family.
pub const SCHEMA_NEXUS_PHP: &str = "NexusPhp";
/// Declared site architecture of the JSON API family.
pub const SCHEMA_MTORRENT: &str = "MTorrent";

/// Declarative configuration of a single tracker site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub code: String,
    pub name: String,
    /// Architecture identifier selecting the client implementation
    pub schema: String,
    pub categories: Option<Categories>,
    pub price: PriceConfig,
    pub required: RequiredConfig,
    /// Count unread messages by listing them instead of trusting the landing page
    pub count_message: bool,
    /// Named request definitions keyed by request id
    pub request_definitions: HashMap<String, RequestDefinition>,
    /// Adapter document interpreted only by the site engine
    pub adapter: Value,
}

impl SiteConfig {
    /// Returns the named request definition, if declared.
    pub fn request_definition(&self, id: &str) -> Option<&RequestDefinition> {
        self.request_definitions.get(id)
    }
}

/// Category mapping used to filter searches by media type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Categories {
    /// Shared query field carrying all selected categories; empty means one
    /// flag parameter per category
    pub field: String,
    /// Separator between category ids in the shared field
    pub delimiter: String,
    pub movie: Vec<MediaCategory>,
    pub tv: Vec<MediaCategory>,
}

/// A single site category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MediaCategory {
    pub id: String,
    pub cat: String,
    pub desc: String,
}

/// Promotion-related capabilities.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriceConfig {
    /// Whether the site runs hit-and-run reviews
    pub has_hr: bool,
}

/// Capabilities that require an explicit request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequiredConfig {
    /// Whether daily sign-in needs a dedicated request
    pub sign_in: bool,
}

/// A request shape understood by the site engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestDefinition {
    pub method: String,
    pub path: String,
    /// Response parser; `None` yields raw bytes
    pub parser: Option<String>,
    /// List extraction rules; present when the request is paginated
    pub list: Option<Value>,
    /// Engine-specific fields passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RequestDefinition {
    /// Creates a raw GET definition for an absolute or site-relative path.
    pub fn raw_get(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            parser: Some("None".to_string()),
            ..Default::default()
        }
    }

    /// Whether the definition extracts a paginated list.
    pub fn is_paginated(&self) -> bool {
        self.list.is_some()
    }
}

/// Source of site configurations keyed by site code.
pub trait SiteConfigSource: Send + Sync + std::fmt::Debug {
    /// Looks up the configuration for `code`.
    ///
    /// # Errors
    /// - `SiteError::ConfigNotFound` - No configuration is registered for the code
    fn config_by_code(&self, code: &str) -> Result<Arc<SiteConfig>, SiteError>;
}

/// In-memory configuration store that can be edited while clients are live.
#[derive(Debug, Default)]
pub struct SiteConfigRegistry {
    configs: RwLock<HashMap<String, Arc<SiteConfig>>>,
}

impl SiteConfigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a set of JSON configuration documents into a registry.
    ///
    /// # Errors
    /// - `SiteError::Decode` - A document is not a valid site configuration
    pub fn from_json_documents<'a>(
        documents: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, SiteError> {
        let registry = Self::new();
        for document in documents {
            let config: SiteConfig = serde_json::from_str(document)?;
            registry.insert(config);
        }
        Ok(registry)
    }

    /// Inserts or replaces the configuration for `config.code`.
    pub fn insert(&self, config: SiteConfig) -> Option<Arc<SiteConfig>> {
        tracing::debug!("Registering site config {} ({})", config.code, config.schema);
        self.configs
            .write()
            .insert(config.code.clone(), Arc::new(config))
    }

    /// Removes the configuration for `code`.
    pub fn remove(&self, code: &str) -> Option<Arc<SiteConfig>> {
        self.configs.write().remove(code)
    }

    /// Number of registered sites.
    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    /// Whether no site is registered.
    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

impl SiteConfigSource for SiteConfigRegistry {
    fn config_by_code(&self, code: &str) -> Result<Arc<SiteConfig>, SiteError> {
        self.configs
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| SiteError::ConfigNotFound {
                code: code.to_string(),
            })
    }
}

/// Tunables shared by every client.
///
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Pause between consecutive page fetches
    pub page_delay: Duration,
    /// Upper bound on pages walked by a single paginated operation
    pub max_pages: usize,
    /// Page size requested from API-style sites
    pub api_page_size: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(500),
            max_pages: 1000,
            api_page_size: 100,
        }
    }
}

impl ClientSettings {
    /// Creates settings with environment variable overrides.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(delay) = std::env::var("BTSITE_PAGE_DELAY_MS") {
            if let Ok(millis) = delay.parse::<u64>() {
                settings.page_delay = Duration::from_millis(millis);
            }
        }

        if let Ok(max_pages) = std::env::var("BTSITE_MAX_PAGES") {
            if let Ok(pages) = max_pages.parse::<usize>() {
                settings.max_pages = pages;
            }
        }

        if let Ok(page_size) = std::env::var("BTSITE_API_PAGE_SIZE") {
            if let Ok(size) = page_size.parse::<u32>() {
                settings.api_page_size = size;
            }
        }

        settings
    }

    /// Creates settings without inter-page delay, for tests.
    pub fn for_testing() -> Self {
        Self {
            page_delay: Duration::ZERO,
            max_pages: 50,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXUS_DOCUMENT: &str = r#"{
        "code": "example",
        "name": "Example",
        "schema": "NexusPhp",
        "categories": {
            "field": "cat",
            "delimiter": ",",
            "movie": [{"id": "401", "cat": "Movies", "desc": "Movies"}],
            "tv": [{"id": "402", "cat": "TV", "desc": "TV Series"}]
        },
        "price": {"has_hr": true},
        "count_message": true,
        "request_definitions": {
            "seeding_statistics": {"method": "GET", "path": "getusertorrentlist.php", "list": {"selector": "tr"}},
            "search": {"method": "GET", "path": "torrents.php", "timeout": 30}
        }
    }"#;

    #[test]
    fn test_registry_loads_json_documents() {
        let registry = SiteConfigRegistry::from_json_documents([NEXUS_DOCUMENT]).unwrap();
        let config = registry.config_by_code("example").unwrap();

        assert_eq!(config.schema, SCHEMA_NEXUS_PHP);
        assert!(config.price.has_hr);
        assert!(!config.required.sign_in);
        assert!(config.count_message);

        let categories = config.categories.as_ref().unwrap();
        assert_eq!(categories.movie[0].id, "401");
        assert_eq!(categories.delimiter, ",");

        let seeding = config.request_definition("seeding_statistics").unwrap();
        assert!(seeding.is_paginated());
        let search = config.request_definition("search").unwrap();
        assert!(!search.is_paginated());
        assert_eq!(search.extra.get("timeout"), Some(&serde_json::json!(30)));
    }

    #[test]
    fn test_registry_edits_are_visible_immediately() {
        let registry = SiteConfigRegistry::new();
        assert!(matches!(
            registry.config_by_code("example"),
            Err(SiteError::ConfigNotFound { code }) if code == "example"
        ));

        registry.insert(SiteConfig {
            code: "example".to_string(),
            schema: SCHEMA_NEXUS_PHP.to_string(),
            ..Default::default()
        });
        assert_eq!(registry.config_by_code("example").unwrap().schema, "NexusPhp");

        registry.insert(SiteConfig {
            code: "example".to_string(),
            schema: SCHEMA_MTORRENT.to_string(),
            ..Default::default()
        });
        assert_eq!(registry.config_by_code("example").unwrap().schema, "MTorrent");
        assert_eq!(registry.len(), 1);

        registry.remove("example");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_settings() {
        let settings = ClientSettings::default();
        assert_eq!(settings.page_delay, Duration::from_millis(500));
        assert_eq!(settings.api_page_size, 100);
        assert_eq!(settings.max_pages, 1000);
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("BTSITE_PAGE_DELAY_MS", "20");
            std::env::set_var("BTSITE_MAX_PAGES", "7");
            std::env::set_var("BTSITE_API_PAGE_SIZE", "not-a-number");
        }

        let settings = ClientSettings::from_env();

        assert_eq!(settings.page_delay, Duration::from_millis(20));
        assert_eq!(settings.max_pages, 7);
        assert_eq!(settings.api_page_size, 100);

        unsafe {
            std::env::remove_var("BTSITE_PAGE_DELAY_MS");
            std::env::remove_var("BTSITE_MAX_PAGES");
            std::env::remove_var("BTSITE_API_PAGE_SIZE");
        }
    }
}
