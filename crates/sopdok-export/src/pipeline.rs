//! Export orchestration
//!
//! Cache lookup, rendering and cache store for one export request. The
//! pipeline holds no per-request state and can be shared between handlers.

use std::sync::Arc;
use std::time::Duration;

use sopdok_layout::constants::EXPORT_SCALE;
use sopdok_ooxml::{OoxmlError, PageDocxWriter};
use sopdok_render::{HtmlRenderer, PdfOptions, ScreenshotOptions};
use tracing::{debug, info, warn};

use crate::cache::{object_name, CacheStore, UploadOptions};
use crate::error::{ExportError, Result};
use crate::pages::{
    document_shell, extract_pages, head_content, page_shell, scaled_viewport, ExtractionStrategy,
    DEFAULT_PAGE_CLASS,
};
use crate::request::{content_disposition, ExportFormat, ExportRequest};

/// Settle delay before the renderer captures
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Tunables for the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub settle_delay: Duration,
    /// Class marking page containers
    pub page_class: String,
    /// Raster scale for DOCX page images
    pub scale: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            page_class: DEFAULT_PAGE_CLASS.to_string(),
            scale: EXPORT_SCALE,
        }
    }
}

/// Whether the artifact came from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value of the `X-Cache` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Result of a successful export
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub file_name: String,
    pub cache_status: CacheStatus,
    /// Pages rendered; `None` for PDF and cache hits
    pub pages: Option<usize>,
    pub strategy: Option<ExtractionStrategy>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn content_disposition(&self) -> String {
        content_disposition(&self.file_name)
    }
}

/// Export pipeline with optional renderer and cache
#[derive(Clone, Default)]
pub struct ExportPipeline {
    renderer: Option<Arc<dyn HtmlRenderer>>,
    cache: Option<Arc<dyn CacheStore>>,
    options: ExportOptions,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("renderer", &self.renderer.as_ref().map(|r| r.name()))
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .field("options", &self.options)
            .finish()
    }
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn HtmlRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Run one export
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportArtifact> {
        let file_name = request.file_name();
        let object = request
            .cache_key
            .as_deref()
            .and_then(|key| object_name(key, request.format));

        if let Some(bytes) = self.lookup(object.as_deref()).await {
            info!(
                format = %request.format,
                bytes = bytes.len(),
                cache = "HIT",
                "export served from cache"
            );
            return Ok(ExportArtifact {
                bytes,
                format: request.format,
                file_name,
                cache_status: CacheStatus::Hit,
                pages: None,
                strategy: None,
            });
        }

        let renderer = self
            .renderer
            .as_deref()
            .ok_or(ExportError::RendererUnavailable)?;

        let (bytes, pages, strategy) = match request.format {
            ExportFormat::Pdf => (self.render_pdf(renderer, &request.html).await?, None, None),
            ExportFormat::Docx => {
                let (bytes, pages, strategy) =
                    self.render_docx(renderer, &request.html, request.title()).await?;
                (bytes, Some(pages), Some(strategy))
            }
        };

        if let Some(object) = object.as_deref() {
            self.store(object, request.format, &bytes).await;
        }

        info!(
            format = %request.format,
            bytes = bytes.len(),
            pages = pages.unwrap_or(1),
            cache = "MISS",
            "export rendered"
        );
        Ok(ExportArtifact {
            bytes,
            format: request.format,
            file_name,
            cache_status: CacheStatus::Miss,
            pages,
            strategy,
        })
    }

    async fn lookup(&self, object: Option<&str>) -> Option<Vec<u8>> {
        let (cache, object) = (self.cache.as_deref()?, object?);
        match cache.download(object).await {
            Ok(Some(bytes)) => Some(bytes),
            Ok(None) => {
                debug!(object, "cache miss");
                None
            }
            Err(e) => {
                warn!(object, store = cache.name(), error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn store(&self, object: &str, format: ExportFormat, bytes: &[u8]) {
        let Some(cache) = self.cache.as_deref() else {
            return;
        };
        let options = UploadOptions::overwrite(format.mime_type());
        if let Err(e) = cache.upload(object, bytes, &options).await {
            warn!(object, store = cache.name(), error = %e, "cache store failed");
        }
    }

    async fn render_pdf(&self, renderer: &dyn HtmlRenderer, html: &str) -> Result<Vec<u8>> {
        let options = PdfOptions::a4().with_wait_delay(self.options.settle_delay);
        Ok(renderer.render_pdf(html, &options).await?)
    }

    async fn render_docx(
        &self,
        renderer: &dyn HtmlRenderer,
        html: &str,
        title: Option<&str>,
    ) -> Result<(Vec<u8>, usize, ExtractionStrategy)> {
        let extracted = extract_pages(html, &self.options.page_class);
        let head = head_content(html);
        let (width, height) = scaled_viewport(self.options.scale);
        let whole_document = extracted.strategy == ExtractionStrategy::WholeDocument;
        let options = if whole_document {
            ScreenshotOptions::full_page(width, height)
        } else {
            ScreenshotOptions::new(width, height)
        }
        .with_wait_delay(self.options.settle_delay);

        let mut writer = PageDocxWriter::new();
        if let Some(title) = title {
            writer = writer.with_title(title);
        }

        // One page at a time; the renderer is a shared external service.
        for (i, fragment) in extracted.pages.iter().enumerate() {
            let shell = if whole_document {
                document_shell(head, fragment, self.options.scale)
            } else {
                page_shell(head, fragment, self.options.scale)
            };
            let png = renderer.screenshot(&shell, &options).await?;
            debug!(page = i + 1, bytes = png.len(), "page captured");
            writer.add_page_png(png).map_err(|e| match e {
                OoxmlError::InvalidImage(reason) => {
                    ExportError::InvalidPageImage(format!("page {}: {}", i + 1, reason))
                }
                other => ExportError::Docx(other),
            })?;
        }

        let bytes = writer.to_bytes()?;
        Ok((bytes, extracted.len(), extracted.strategy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_status_header_values() {
        assert_eq!(CacheStatus::Hit.as_str(), "HIT");
        assert_eq!(CacheStatus::Miss.as_str(), "MISS");
    }

    #[test]
    fn test_default_options() {
        let options = ExportOptions::default();
        assert_eq!(options.scale, 2);
        assert_eq!(options.page_class, "sop-page");
        assert_eq!(options.settle_delay, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_no_renderer_signals_fallback() {
        let pipeline = ExportPipeline::new();
        let err = pipeline
            .export(&ExportRequest::new("<p>x</p>", ExportFormat::Pdf))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::RendererUnavailable));
        assert!(err.is_fallback());
    }
}
