//! Request handlers

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use sopdok_export::{ErrorKind, ExportError, ExportPipeline, ExportRequest};
use tracing::{debug, error, warn};

use crate::cors::{request_origin, OriginCheck, OriginPolicy};

/// Shared handler state
#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<ExportPipeline>,
    pub origins: Arc<OriginPolicy>,
}

impl AppState {
    pub fn new(pipeline: ExportPipeline, origins: OriginPolicy) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            origins: Arc::new(origins),
        }
    }
}

/// JSON error body `{error, message}`
pub fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    let body = Json(json!({
        "error": error,
        "message": message.into(),
    }));
    (status, body).into_response()
}

/// 503 telling the client to export locally
pub fn fallback_response(message: impl Into<String>) -> Response {
    let body = Json(json!({
        "error": "renderer_unavailable",
        "message": message.into(),
        "fallback": true,
    }));
    (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
}

fn export_error_response(err: &ExportError) -> Response {
    match err.kind() {
        ErrorKind::BadRequest => {
            error_response(StatusCode::BAD_REQUEST, "invalid_request", err.to_string())
        }
        ErrorKind::Fallback => {
            warn!(error = %err, "rendering unavailable, client should fall back");
            fallback_response(err.to_string())
        }
        ErrorKind::Internal => {
            error!(error = %err, "export failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An unexpected error occurred while exporting the document",
            )
        }
    }
}

/// `POST /` and `POST /export`
pub async fn export_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match ExportRequest::from_json(&body) {
        Ok(request) => request,
        Err(err) => return export_error_response(&err),
    };

    let origin = request_origin(&headers);
    if state.origins.check(origin) == OriginCheck::Denied {
        warn!(origin = origin.unwrap_or_default(), "export origin not allowed");
        return error_response(
            StatusCode::FORBIDDEN,
            "origin_not_allowed",
            "Requests from this origin are not allowed",
        );
    }

    let artifact = match state.pipeline.export(&request).await {
        Ok(artifact) => artifact,
        Err(err) => return export_error_response(&err),
    };

    debug!(
        format = %artifact.format,
        file = %artifact.file_name,
        bytes = artifact.bytes.len(),
        cache = artifact.cache_status.as_str(),
        "export served"
    );

    let content_type = artifact.mime_type();
    let disposition = artifact.content_disposition();
    let cache_status = artifact.cache_status.as_str();

    let mut resp = (StatusCode::OK, artifact.bytes).into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    headers.insert("x-cache", HeaderValue::from_static(cache_status));
    resp
}

/// `GET /healthz`
pub async fn healthz_handler(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "renderer": state.pipeline.has_renderer(),
        "cache": state.pipeline.has_cache(),
    }))
    .into_response()
}
