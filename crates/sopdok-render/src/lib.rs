//! # sopdok-render
//!
//! Client for a headless Chromium rendering service (Gotenberg API), used to
//! turn paginated SOP HTML into PDF files or per-page PNG images.
//!
//! ## Example
//!
//! ```no_run
//! use sopdok_render::{HtmlRenderer, PdfOptions, RenderClient};
//!
//! # async fn run() -> sopdok_render::Result<()> {
//! let client = RenderClient::new("http://localhost:3000")?;
//! let pdf = client
//!     .render_pdf("<html><body>SOP</body></html>", &PdfOptions::a4())
//!     .await?;
//! assert!(pdf.starts_with(b"%PDF"));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{content_hash, HtmlRenderer, RenderClient, DEFAULT_TIMEOUT};
pub use error::{RenderError, Result};
pub use types::{ImageFormat, Margins, PaperSize, PdfOptions, ScreenshotOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
