//! Service configuration
//!
//! Settings come from an optional TOML file and from the environment, with
//! environment variables taking precedence. Missing renderer or cache
//! settings are not errors: the service then answers every render with a
//! fallback signal, or runs without a cache.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8000"
//! allowed_origins = ["https://sop.example.org"]
//!
//! [renderer]
//! url = "http://gotenberg:3000"
//!
//! [cache]
//! url = "https://project.supabase.co"
//! service_key = "..."
//! bucket = "exports"
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sopdok_export::{ExportOptions, ExportPipeline, SupabaseStorage, DEFAULT_BUCKET};
use sopdok_render::RenderClient;
use tracing::{info, warn};

use crate::error::ConfigError;

pub const ENV_CONFIG_FILE: &str = "SOPDOK_CONFIG";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_RENDERER_URL: &str = "GOTENBERG_URL";
pub const ENV_CACHE_BUCKET: &str = "EXPORT_CACHE_BUCKET";
pub const ENV_ALLOWED_ORIGINS: &str = "EXPORT_ALLOWED_ORIGINS";
pub const ENV_BIND: &str = "EXPORT_BIND";
pub const ENV_SETTLE_DELAY_MS: &str = "EXPORT_SETTLE_DELAY_MS";
pub const ENV_MAX_BODY_BYTES: &str = "EXPORT_MAX_BODY_BYTES";

pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Top-level service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub renderer: RendererSettings,
    pub cache: CacheSettings,
}

/// Listener and request handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub max_body_bytes: usize,
    /// Added to the built-in origin allow-list
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origins: Vec::new(),
        }
    }
}

/// External rendering service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub url: Option<String>,
    pub settle_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            url: None,
            settle_delay_ms: 1000,
            timeout_secs: 60,
        }
    }
}

/// Artifact cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub bucket: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ServiceConfig {
    /// Parse a TOML document
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Read a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// File (explicit path, else `SOPDOK_CONFIG`) overlaid with the
    /// process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(ENV_CONFIG_FILE).ok();
        let path = path.or(from_env.as_deref().map(Path::new));
        let mut config = match path {
            Some(path) => {
                info!(path = %path.display(), "loading config file");
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Overlay values from an environment lookup
    ///
    /// Unparseable numbers keep the current value.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(ENV_RENDERER_URL)) {
            self.renderer.url = Some(url);
        }
        if let Some(url) = non_empty(lookup(ENV_SUPABASE_URL)) {
            self.cache.url = Some(url);
        }
        if let Some(key) = non_empty(lookup(ENV_SUPABASE_KEY)) {
            self.cache.service_key = Some(key);
        }
        if let Some(bucket) = non_empty(lookup(ENV_CACHE_BUCKET)) {
            self.cache.bucket = bucket;
        }
        if let Some(bind) = non_empty(lookup(ENV_BIND)) {
            self.server.bind = bind;
        }
        if let Some(raw) = lookup(ENV_ALLOWED_ORIGINS) {
            self.server.allowed_origins.extend(
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string),
            );
        }
        if let Some(ms) = lookup(ENV_SETTLE_DELAY_MS).and_then(|v| v.trim().parse().ok()) {
            self.renderer.settle_delay_ms = ms;
        }
        if let Some(bytes) = lookup(ENV_MAX_BODY_BYTES).and_then(|v| v.trim().parse().ok()) {
            self.server.max_body_bytes = bytes;
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.renderer.settle_delay_ms)
    }

    /// Cache is enabled only with both a URL and a key
    pub fn cache_enabled(&self) -> bool {
        non_empty(self.cache.url.clone()).is_some()
            && non_empty(self.cache.service_key.clone()).is_some()
    }

    /// Export pipeline wired to the configured collaborators
    pub fn build_pipeline(&self) -> Result<ExportPipeline, ConfigError> {
        let options = ExportOptions {
            settle_delay: self.settle_delay(),
            ..ExportOptions::default()
        };
        let mut pipeline = ExportPipeline::new().with_options(options);

        match non_empty(self.renderer.url.clone()) {
            Some(url) => {
                let timeout = Duration::from_secs(self.renderer.timeout_secs.max(1));
                let client = RenderClient::with_timeout(url, timeout)?;
                info!(renderer = client.base_url(), "rendering service configured");
                pipeline = pipeline.with_renderer(Arc::new(client));
            }
            None => warn!("no rendering service configured, exports will signal fallback"),
        }

        if self.cache_enabled() {
            let store = SupabaseStorage::new(
                self.cache.url.clone().unwrap_or_default(),
                self.cache.service_key.clone().unwrap_or_default(),
                self.cache.bucket.clone(),
            )?;
            info!(bucket = store.bucket(), "export cache enabled");
            pipeline = pipeline.with_cache(Arc::new(store));
        }

        Ok(pipeline)
    }
}
