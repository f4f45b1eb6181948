//! Shared setup for integration tests.

use std::sync::{Arc, Once};
use std::time::Duration;

use btsite_core::{
    ClientFactory, ClientSettings, ScriptedEngine, Site, SiteConfig, SiteConfigRegistry,
    SiteConfigSource,
};

static TRACING: Once = Once::new();

/// Installs a test-friendly subscriber honouring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub const NEXUS_CONFIG: &str = r#"{
    "code": "nexus",
    "name": "Nexus Example",
    "schema": "NexusPhp",
    "categories": {
        "field": "cat",
        "delimiter": ",",
        "movie": [{"id": "401", "cat": "Movies", "desc": "Movies"}],
        "tv": [{"id": "402", "cat": "TV", "desc": "TV Series"}]
    },
    "price": {"has_hr": true},
    "required": {"sign_in": true},
    "request_definitions": {
        "seeding_statistics": {"method": "GET", "path": "getusertorrentlistajax.php", "list": {"selector": "tr"}},
        "search": {"method": "GET", "path": "torrents.php"}
    }
}"#;

pub const MTORRENT_CONFIG: &str = r#"{
    "code": "mteam",
    "name": "M-Team",
    "schema": "MTorrent",
    "request_definitions": {
        "search": {"method": "POST", "path": "/api/torrent/search"}
    }
}"#;

/// Registry, engine and factory wired together.
pub struct Harness {
    pub registry: Arc<SiteConfigRegistry>,
    pub engine: Arc<ScriptedEngine>,
    pub factory: ClientFactory,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ClientSettings::for_testing())
    }

    pub fn with_settings(settings: ClientSettings) -> Self {
        init_tracing();
        let registry = Arc::new(
            SiteConfigRegistry::from_json_documents([NEXUS_CONFIG, MTORRENT_CONFIG])
                .expect("fixture configs parse"),
        );
        let engine = Arc::new(ScriptedEngine::new());
        let factory =
            ClientFactory::new(registry.clone(), engine.clone()).with_settings(settings);
        Self {
            registry,
            engine,
            factory,
        }
    }

    pub fn registry_config(&self, code: &str) -> Arc<SiteConfig> {
        self.registry
            .config_by_code(code)
            .expect("fixture config registered")
    }
}

pub fn nexus_site() -> Site {
    Site {
        code: "nexus".to_string(),
        name: "Nexus Example".to_string(),
        user_id: "42".to_string(),
        domain: "https://nexus.example/".to_string(),
        cookie: "c_secure_uid=42".to_string(),
        headers: "Referer: https://nexus.example/\nAccept: text/html".to_string(),
        rss_url: "https://nexus.example/torrentrss.php?passkey=abc".to_string(),
        ..Default::default()
    }
}

pub fn mtorrent_site() -> Site {
    Site {
        code: "mteam".to_string(),
        name: "M-Team".to_string(),
        user_id: "1001".to_string(),
        api: "https://api.mteam.example".to_string(),
        headers: "x-api-key: secret".to_string(),
        ..Default::default()
    }
}

pub fn fast_settings(max_pages: usize) -> ClientSettings {
    ClientSettings {
        page_delay: Duration::ZERO,
        max_pages,
        ..ClientSettings::default()
    }
}
