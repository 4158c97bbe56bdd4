//! Error types for the export service

use std::path::PathBuf;

use sopdok_export::CacheError;
use sopdok_render::RenderError;
use thiserror::Error;

/// Errors while loading configuration or wiring collaborators
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Renderer client could not be built
    #[error("Invalid renderer configuration: {0}")]
    Renderer(#[from] RenderError),

    /// Cache client could not be built
    #[error("Invalid cache configuration: {0}")]
    Cache(#[from] CacheError),
}

/// Errors that stop the service
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bind or accept failure
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for service startup
pub type Result<T> = std::result::Result<T, ServerError>;
