//! Export cache
//!
//! Rendered artifacts are stored as objects in a key-addressed blob store.
//! Object names are `<sanitized key>.<ext>`, so the same key can hold one
//! PDF and one DOCX. Writes overwrite (last write wins).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use sopdok_render::content_hash;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::request::ExportFormat;

/// Default storage bucket
pub const DEFAULT_BUCKET: &str = "exports";

/// Default request timeout for the storage service
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_OBJECT_KEY_LEN: usize = 200;

/// Errors from the cache store
#[derive(Error, Debug)]
pub enum CacheError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage answered with an unexpected status
    #[error("Storage error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Store is missing credentials or URL
    #[error("Cache store not configured: {0}")]
    NotConfigured(String),
}

/// Upload settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Replace an existing object
    pub upsert: bool,
}

impl UploadOptions {
    pub fn overwrite(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            upsert: true,
        }
    }
}

/// Key-addressed blob storage
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fetch an object; `None` when it does not exist
    async fn download(&self, object: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store an object
    async fn upload(
        &self,
        object: &str,
        bytes: &[u8],
        options: &UploadOptions,
    ) -> Result<(), CacheError>;
}

/// Object name for a cache key and format
///
/// Characters outside `[A-Za-z0-9._-]` become `_` and the key is capped in
/// length. Returns `None` when nothing usable remains.
pub fn object_name(key: &str, format: ExportFormat) -> Option<String> {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_OBJECT_KEY_LEN)
        .collect();
    let sanitized = sanitized.trim_matches('.');
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        return None;
    }
    Some(format!("{}.{}", sanitized, format.extension()))
}

/// Content-derived cache key for callers that do not bring their own
pub fn cache_key_for(html: &str, format: ExportFormat) -> String {
    let hash = content_hash(html.as_bytes());
    let hex = hash.strip_prefix("sha256:").unwrap_or(&hash);
    format!("{}-{}", format.extension(), hex)
}

/// Supabase Storage backed cache
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    base_url: String,
    service_key: String,
    bucket: String,
    client: Client,
}

impl SupabaseStorage {
    /// Create a store for a project URL, service key and bucket
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Result<Self, CacheError> {
        Self::with_timeout(base_url, service_key, bucket, DEFAULT_CACHE_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CacheError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let service_key = service_key.into();
        let bucket = bucket.into();
        if base_url.is_empty() || service_key.is_empty() {
            return Err(CacheError::NotConfigured(
                "storage URL and service key are required".to_string(),
            ));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            service_key,
            bucket,
            client,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object endpoint URL
    pub fn object_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, object
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

/// Storage reports missing objects as 404, or as 400 with a not-found body
fn is_not_found(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }
    let body = body.to_lowercase();
    status == StatusCode::BAD_REQUEST && (body.contains("not found") || body.contains("not_found"))
}

#[async_trait]
impl CacheStore for SupabaseStorage {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn download(&self, object: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let response = self
            .authorize(self.client.get(self.object_url(object)))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            debug!(object, bytes = bytes.len(), "cache object downloaded");
            return Ok(Some(bytes.to_vec()));
        }

        let message = response.text().await.unwrap_or_default();
        if is_not_found(status, &message) {
            return Ok(None);
        }
        Err(CacheError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn upload(
        &self,
        object: &str,
        bytes: &[u8],
        options: &UploadOptions,
    ) -> Result<(), CacheError> {
        let response = self
            .authorize(self.client.post(self.object_url(object)))
            .header("content-type", &options.content_type)
            .header("x-upsert", options.upsert.to_string())
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CacheError::Status {
                status: status.as_u16(),
                message,
            });
        }
        debug!(object, bytes = bytes.len(), "cache object uploaded");
        Ok(())
    }
}

/// Process-local cache, for tests and single-node setups
#[derive(Debug, Default)]
pub struct MemoryCache {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, object: &str) -> bool {
        self.objects.read().await.contains_key(object)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn download(&self, object: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.objects.read().await.get(object).cloned())
    }

    async fn upload(
        &self,
        object: &str,
        bytes: &[u8],
        options: &UploadOptions,
    ) -> Result<(), CacheError> {
        let mut objects = self.objects.write().await;
        if !options.upsert && objects.contains_key(object) {
            return Err(CacheError::Status {
                status: 409,
                message: format!("object {} already exists", object),
            });
        }
        objects.insert(object.to_string(), bytes.to_vec());
        Ok(())
    }
}
