//! # sopdok-ooxml
//!
//! Minimal Office Open XML writer. Turns a sequence of rendered page images
//! into a Word document with one full-bleed picture per A4 page.
//!
//! ## Package layout
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml
//! word/document.xml
//! word/_rels/document.xml.rels
//! word/media/page1.png ... pageN.png
//! ```

pub mod archive;
pub mod error;
pub mod image;
pub mod relationships;
pub mod writer;

pub use archive::OoxmlArchive;
pub use error::{OoxmlError, Result};
pub use image::{png_dimensions, PageImage};
pub use relationships::Relationships;
pub use writer::{assemble_pages, PageDocxWriter, PageSetup};

/// MIME type of a DOCX file
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
