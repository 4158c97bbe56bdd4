//! Headless rendering service client
//!
//! Talks to a Gotenberg-compatible Chromium service: every call is a
//! multipart POST carrying the document as `index.html` plus named option
//! fields, and the response body is the rendered file.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::types::{PdfOptions, ScreenshotOptions};

/// HTML → PDF route
pub const PDF_ROUTE: &str = "/forms/chromium/convert/html";

/// HTML → image route
pub const SCREENSHOT_ROUTE: &str = "/forms/chromium/screenshot/html";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Something that turns HTML into PDF bytes or page images
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Render a full document to PDF
    async fn render_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Capture a document as a raster image
    async fn screenshot(&self, html: &str, options: &ScreenshotOptions) -> Result<Vec<u8>>;
}

/// Client for the rendering service
#[derive(Debug, Clone)]
pub struct RenderClient {
    /// Base URL of the service
    base_url: String,
    /// HTTP client
    client: Client,
    /// Request timeout
    timeout: Duration,
}

impl RenderClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RenderError::NotConfigured);
        }
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            client,
            timeout,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn document_form(html: &str, fields: Vec<(&'static str, String)>) -> Result<Form> {
        let file = Part::bytes(html.as_bytes().to_vec())
            .file_name("index.html")
            .mime_str("text/html")?;
        let form = fields
            .into_iter()
            .fold(Form::new().part("files", file), |form, (name, value)| {
                form.text(name, value)
            });
        Ok(form)
    }

    async fn post_form(&self, route: &str, form: Form) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, route);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RenderError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(RenderError::EmptyResponse);
        }
        debug!(route, bytes = bytes.len(), "rendering service responded");
        Ok(bytes.to_vec())
    }

    /// Check if the service is reachable and healthy
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl HtmlRenderer for RenderClient {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn render_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>> {
        let form = Self::document_form(html, options.form_fields())?;
        self.post_form(PDF_ROUTE, form).await
    }

    async fn screenshot(&self, html: &str, options: &ScreenshotOptions) -> Result<Vec<u8>> {
        options.validate()?;
        let form = Self::document_form(html, options.form_fields())?;
        self.post_form(SCREENSHOT_ROUTE, form).await
    }
}

/// Compute SHA-256 hash of content
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// Helper to format hash as hex string
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = RenderClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_empty_url_is_not_configured() {
        assert!(matches!(
            RenderClient::new(""),
            Err(RenderError::NotConfigured)
        ));
    }

    #[test]
    fn test_content_hash() {
        let hash = content_hash(b"<html></html>");
        assert!(hash.starts_with("sha256:"));
        assert_eq!(hash.len(), 7 + 64);
        assert_eq!(hash, content_hash(b"<html></html>"));
        assert_ne!(hash, content_hash(b"<html> </html>"));
    }
}
