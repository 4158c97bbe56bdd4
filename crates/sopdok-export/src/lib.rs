//! # sopdok-export
//!
//! Server-side export of paginated SOP documents.
//!
//! An [`ExportRequest`] carries the editor's HTML and the wanted format.
//! The [`ExportPipeline`] answers it from the cache when it can, and
//! otherwise renders it:
//!
//! - **PDF**: the whole document goes to the rendering service once.
//! - **DOCX**: every page container is captured as a PNG at twice the page
//!   size and the images are assembled into a Word file, one per page.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sopdok_export::{ExportFormat, ExportPipeline, ExportRequest, MemoryCache};
//! use sopdok_render::RenderClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ExportPipeline::new()
//!     .with_renderer(Arc::new(RenderClient::new("http://localhost:3000")?))
//!     .with_cache(Arc::new(MemoryCache::new()));
//!
//! let request = ExportRequest::new("<html>...</html>", ExportFormat::Docx)
//!     .with_title("Hand Hygiene")
//!     .with_cache_key("sop-12-rev-3");
//! let artifact = pipeline.export(&request).await?;
//! std::fs::write(&artifact.file_name, &artifact.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod pages;
pub mod pipeline;
pub mod request;

pub use cache::{
    cache_key_for, object_name, CacheError, CacheStore, MemoryCache, SupabaseStorage,
    UploadOptions, DEFAULT_BUCKET,
};
pub use error::{ErrorKind, ExportError, Result};
pub use pages::{
    document_shell, extract_pages, page_shell, ExtractedPages, ExtractionStrategy, DEFAULT_PAGE_CLASS,
};
pub use pipeline::{
    CacheStatus, ExportArtifact, ExportOptions, ExportPipeline, DEFAULT_SETTLE_DELAY,
};
pub use request::{
    content_disposition, file_name_for, ExportFormat, ExportMetadata, ExportRequest,
    RawExportRequest,
};
