//! End-to-end pipeline behaviour with in-process renderer and cache fakes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sopdok_export::{
    CacheError, CacheStatus, CacheStore, ErrorKind, ExportError, ExportFormat, ExportPipeline,
    ExportRequest, ExtractionStrategy, MemoryCache, UploadOptions,
};
use sopdok_ooxml::OoxmlArchive;
use sopdok_render::{HtmlRenderer, PdfOptions, RenderError, ScreenshotOptions};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

#[derive(Default)]
struct FakeRenderer {
    pdf_calls: AtomicUsize,
    shots: Mutex<Vec<(String, u32, u32, bool)>>,
}

#[async_trait]
impl HtmlRenderer for FakeRenderer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn render_pdf(&self, html: &str, options: &PdfOptions) -> sopdok_render::Result<Vec<u8>> {
        self.pdf_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(options.margins.top, 0.0);
        Ok(format!("%PDF-1.7 {}", html.len()).into_bytes())
    }

    async fn screenshot(
        &self,
        html: &str,
        options: &ScreenshotOptions,
    ) -> sopdok_render::Result<Vec<u8>> {
        self.shots
            .lock()
            .unwrap()
            .push((html.to_string(), options.width, options.height, options.clip));
        Ok(png(options.width, options.height))
    }
}

/// Renderer whose service is down
struct DownRenderer;

#[async_trait]
impl HtmlRenderer for DownRenderer {
    fn name(&self) -> &'static str {
        "down"
    }

    async fn render_pdf(&self, _: &str, _: &PdfOptions) -> sopdok_render::Result<Vec<u8>> {
        Err(RenderError::ServerError {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }

    async fn screenshot(&self, _: &str, _: &ScreenshotOptions) -> sopdok_render::Result<Vec<u8>> {
        Err(RenderError::EmptyResponse)
    }
}

/// Renderer returning something other than an image
struct GarbageRenderer;

#[async_trait]
impl HtmlRenderer for GarbageRenderer {
    fn name(&self) -> &'static str {
        "garbage"
    }

    async fn render_pdf(&self, _: &str, _: &PdfOptions) -> sopdok_render::Result<Vec<u8>> {
        Ok(b"%PDF".to_vec())
    }

    async fn screenshot(&self, _: &str, _: &ScreenshotOptions) -> sopdok_render::Result<Vec<u8>> {
        Ok(b"<html>error page</html>".to_vec())
    }
}

/// Cache whose backend rejects every call
struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn download(&self, _: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Status {
            status: 500,
            message: "storage down".to_string(),
        })
    }

    async fn upload(&self, _: &str, _: &[u8], _: &UploadOptions) -> Result<(), CacheError> {
        Err(CacheError::Status {
            status: 500,
            message: "storage down".to_string(),
        })
    }
}

const THREE_PAGES: &str = r#"<!DOCTYPE html>
<html>
<head><style>.sop-page { width: 794px; height: 1123px; }</style></head>
<body>
<div class="editor">
  <div class="sop-page"><h1>Hand Hygiene</h1><img src="logo.png"></div>
  <div class="sop-page first"><p>Step 1</p><br></div>
  <div class="sop-page"><table><tr><td>Signature</td></tr></table></div>
</div>
</body>
</html>"#;

mod pdf {
    use super::*;

    #[tokio::test]
    async fn renders_whole_document_once() {
        let renderer = Arc::new(FakeRenderer::default());
        let pipeline = ExportPipeline::new().with_renderer(renderer.clone());

        let request = ExportRequest::new(THREE_PAGES, ExportFormat::Pdf).with_title("Hand Hygiene");
        let artifact = pipeline.export(&request).await.unwrap();

        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(artifact.mime_type(), "application/pdf");
        assert_eq!(artifact.file_name, "Hand Hygiene.pdf");
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"Hand Hygiene.pdf\""
        );
        assert_eq!(artifact.cache_status, CacheStatus::Miss);
        assert_eq!(renderer.pdf_calls.load(Ordering::SeqCst), 1);
        assert!(renderer.shots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn renderer_failure_is_a_fallback() {
        let pipeline = ExportPipeline::new().with_renderer(Arc::new(DownRenderer));
        let err = pipeline
            .export(&ExportRequest::new(THREE_PAGES, ExportFormat::Pdf))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
        assert_eq!(err.kind(), ErrorKind::Fallback);
    }
}

mod docx {
    use super::*;

    #[tokio::test]
    async fn one_image_per_page() {
        let renderer = Arc::new(FakeRenderer::default());
        let pipeline = ExportPipeline::new().with_renderer(renderer.clone());

        let request = ExportRequest::new(THREE_PAGES, ExportFormat::Docx).with_title("Hand Hygiene");
        let artifact = pipeline.export(&request).await.unwrap();

        assert_eq!(artifact.pages, Some(3));
        assert_eq!(artifact.strategy, Some(ExtractionStrategy::Structural));
        assert_eq!(artifact.file_name, "Hand Hygiene.docx");

        let shots = renderer.shots.lock().unwrap();
        assert_eq!(shots.len(), 3);
        for (shell, width, height, clip) in shots.iter() {
            assert_eq!((*width, *height), (1588, 2246));
            assert!(*clip);
            assert!(shell.contains("transform: scale(2)"));
            assert!(shell.contains(".sop-page { width: 794px"));
        }
        assert!(shots[0].0.contains("Hand Hygiene"));
        assert!(shots[1].0.contains("Step 1"));
        assert!(shots[2].0.contains("Signature"));

        let archive = OoxmlArchive::from_bytes(&artifact.bytes).unwrap();
        for n in 1..=3 {
            assert!(archive.contains(&format!("word/media/page{n}.png")));
        }
        let doc = archive.get_string("word/document.xml").unwrap();
        assert_eq!(doc.matches("<w:drawing>").count(), 3);
        assert_eq!(doc.matches("w:type=\"page\"").count(), 2);
        let core = archive.get_string("docProps/core.xml").unwrap();
        assert!(core.contains("<dc:title>Hand Hygiene</dc:title>"));
    }

    #[tokio::test]
    async fn malformed_markup_uses_tag_scan() {
        let html = r#"<body><p>unclosed<div class="sop-page">A</div><div class="sop-page">B</div></body>"#;
        let renderer = Arc::new(FakeRenderer::default());
        let pipeline = ExportPipeline::new().with_renderer(renderer.clone());

        let artifact = pipeline
            .export(&ExportRequest::new(html, ExportFormat::Docx))
            .await
            .unwrap();
        assert_eq!(artifact.strategy, Some(ExtractionStrategy::TagScan));
        assert_eq!(artifact.pages, Some(2));
        assert_eq!(artifact.file_name, "document.docx");
    }

    #[tokio::test]
    async fn no_pages_exports_whole_document() {
        let renderer = Arc::new(FakeRenderer::default());
        let pipeline = ExportPipeline::new().with_renderer(renderer.clone());

        let artifact = pipeline
            .export(&ExportRequest::new(
                "<html><body><p>Loose content</p></body></html>",
                ExportFormat::Docx,
            ))
            .await
            .unwrap();
        assert_eq!(artifact.strategy, Some(ExtractionStrategy::WholeDocument));
        assert_eq!(artifact.pages, Some(1));
        assert!(renderer.shots.lock().unwrap()[0].0.contains("Loose content"));
    }

    #[tokio::test]
    async fn whole_document_capture_is_not_cut_at_one_page() {
        let renderer = Arc::new(FakeRenderer::default());
        let pipeline = ExportPipeline::new().with_renderer(renderer.clone());
        let tall = format!(
            "<html><body>{}<p>Last line</p></body></html>",
            "<p style=\"height: 1000px\">Step</p>".repeat(3)
        );

        let artifact = pipeline
            .export(&ExportRequest::new(tall, ExportFormat::Docx))
            .await
            .unwrap();
        assert_eq!(artifact.strategy, Some(ExtractionStrategy::WholeDocument));

        let shots = renderer.shots.lock().unwrap();
        assert_eq!(shots.len(), 1);
        let (shell, width, _, clip) = &shots[0];
        assert_eq!(*width, 1588);
        assert!(!*clip, "whole document must be captured past the viewport");
        assert!(!shell.contains("overflow: hidden"));
        assert!(shell.contains("min-height: 2246px"));
        assert!(shell.contains("Last line"));
    }

    #[tokio::test]
    async fn non_image_capture_is_a_fallback() {
        let pipeline = ExportPipeline::new().with_renderer(Arc::new(GarbageRenderer));
        let err = pipeline
            .export(&ExportRequest::new(THREE_PAGES, ExportFormat::Docx))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidPageImage(_)));
        assert!(err.is_fallback());
    }
}

mod caching {
    use super::*;

    #[tokio::test]
    async fn second_request_is_a_byte_identical_hit() {
        let renderer = Arc::new(FakeRenderer::default());
        let cache = Arc::new(MemoryCache::new());
        let pipeline = ExportPipeline::new()
            .with_renderer(renderer.clone())
            .with_cache(cache.clone());

        let request = ExportRequest::new(THREE_PAGES, ExportFormat::Pdf).with_cache_key("sop-12");
        let first = pipeline.export(&request).await.unwrap();
        let second = pipeline.export(&request).await.unwrap();

        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(renderer.pdf_calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("sop-12.pdf").await);
    }

    #[tokio::test]
    async fn formats_do_not_share_entries() {
        let cache = Arc::new(MemoryCache::new());
        let pipeline = ExportPipeline::new()
            .with_renderer(Arc::new(FakeRenderer::default()))
            .with_cache(cache.clone());

        let pdf = ExportRequest::new(THREE_PAGES, ExportFormat::Pdf).with_cache_key("k");
        let docx = ExportRequest::new(THREE_PAGES, ExportFormat::Docx).with_cache_key("k");
        pipeline.export(&pdf).await.unwrap();
        let artifact = pipeline.export(&docx).await.unwrap();

        assert_eq!(artifact.cache_status, CacheStatus::Miss);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn hit_is_served_without_renderer() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .upload("cached.pdf", b"%PDF-cached", &UploadOptions::overwrite("application/pdf"))
            .await
            .unwrap();
        let pipeline = ExportPipeline::new().with_cache(cache);

        let request = ExportRequest::new("<p/>", ExportFormat::Pdf).with_cache_key("cached");
        let artifact = pipeline.export(&request).await.unwrap();
        assert_eq!(artifact.cache_status, CacheStatus::Hit);
        assert_eq!(artifact.bytes, b"%PDF-cached");
    }

    #[tokio::test]
    async fn without_key_nothing_is_stored() {
        let cache = Arc::new(MemoryCache::new());
        let pipeline = ExportPipeline::new()
            .with_renderer(Arc::new(FakeRenderer::default()))
            .with_cache(cache.clone());

        pipeline
            .export(&ExportRequest::new(THREE_PAGES, ExportFormat::Pdf))
            .await
            .unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn cache_errors_do_not_fail_the_export() {
        let pipeline = ExportPipeline::new()
            .with_renderer(Arc::new(FakeRenderer::default()))
            .with_cache(Arc::new(BrokenCache));

        let request = ExportRequest::new(THREE_PAGES, ExportFormat::Pdf).with_cache_key("k");
        let artifact = pipeline.export(&request).await.unwrap();
        assert_eq!(artifact.cache_status, CacheStatus::Miss);
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }
}
