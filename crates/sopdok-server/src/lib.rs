//! # sopdok-server
//!
//! HTTP front of the export pipeline.
//!
//! | Route             | Method  | Purpose                                  |
//! |-------------------|---------|------------------------------------------|
//! | `/`, `/export`    | POST    | Export HTML to PDF or DOCX               |
//! | any               | OPTIONS | CORS preflight                           |
//! | `/healthz`        | GET     | Liveness and collaborator status         |
//!
//! Responses of the export route:
//!
//! - `200` with the file, `Content-Disposition` and `X-Cache: HIT|MISS`
//! - `400` `{error, message}` for a missing `html` or `format`
//! - `403` `{error, message}` for an origin outside the allow-list
//! - `503` `{error, message, fallback: true}` when rendering is unavailable
//! - `500` `{error, message}` for anything else

pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;

pub use app::{app_state, build_router, serve, serve_on};
pub use config::ServiceConfig;
pub use cors::{OriginCheck, OriginPolicy, DEFAULT_ALLOWED_ORIGINS};
pub use error::{ConfigError, Result, ServerError};
pub use handlers::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
