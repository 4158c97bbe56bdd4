//! Error types for rendering operations

use thiserror::Error;

/// Errors that can occur while talking to the rendering service
#[derive(Error, Debug)]
pub enum RenderError {
    /// No rendering service is configured
    #[error("Rendering service not configured")]
    NotConfigured,

    /// HTTP request error (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Service answered 2xx with no body
    #[error("Rendering service returned an empty document")]
    EmptyResponse,

    /// Options that cannot be sent to the service
    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;
