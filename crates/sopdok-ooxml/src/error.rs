//! Error types for package assembly

use thiserror::Error;

/// Errors while building or reading a Word package
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// ZIP container error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML in a package part
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Part expected in the package is absent
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Part exists but cannot be used
    #[error("Invalid package part: {0}")]
    InvalidPart(String),

    /// Page image is not a usable PNG
    #[error("Invalid page image: {0}")]
    InvalidImage(String),

    /// A document needs at least one page
    #[error("Document has no pages")]
    EmptyDocument,
}

/// Result type for package operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
