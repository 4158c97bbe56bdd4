//! Error types for export operations

use sopdok_ooxml::OoxmlError;
use sopdok_render::RenderError;
use thiserror::Error;

/// How a failure should be reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable
    BadRequest,
    /// Server-side rendering is unavailable; the client should export locally
    Fallback,
    /// Anything else
    Internal,
}

/// Errors that can occur while exporting a document
#[derive(Error, Debug)]
pub enum ExportError {
    /// A mandatory request field is absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Requested format is not supported
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Request body is not valid JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// No rendering service configured
    #[error("Rendering service is not configured")]
    RendererUnavailable,

    /// The rendering service failed
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    /// The rendering service returned something that is not a page image
    #[error("Rendering service returned an unusable page image: {0}")]
    InvalidPageImage(String),

    /// Assembling the Word package failed
    #[error("DOCX assembly failed: {0}")]
    Docx(#[from] OoxmlError),
}

impl ExportError {
    /// Reporting class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_) | Self::UnsupportedFormat(_) | Self::InvalidBody(_) => {
                ErrorKind::BadRequest
            }
            Self::RendererUnavailable | Self::Render(_) | Self::InvalidPageImage(_) => {
                ErrorKind::Fallback
            }
            Self::Docx(_) => ErrorKind::Internal,
        }
    }

    /// Whether the client should fall back to local export
    pub fn is_fallback(&self) -> bool {
        self.kind() == ErrorKind::Fallback
    }
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
