//! Origin allow-list and CORS headers

use std::sync::OnceLock;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use regex::Regex;

use crate::handlers::AppState;

/// Origins always allowed to call the export endpoint
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["https://sopdok.app", "https://www.sopdok.app"];

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const EXPOSE_HEADERS: &str = "content-disposition, x-cache";

fn local_origin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://(localhost|127\.0\.0\.1)(:\d{1,5})?$").unwrap())
}

/// Outcome of checking a request's `Origin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginCheck {
    /// No `Origin` header: same-origin or server-to-server
    Absent,
    Allowed,
    Denied,
}

/// Exact allow-list plus any local development origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

impl OriginPolicy {
    /// Built-in origins followed by `extra`
    pub fn new(extra: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut allowed: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .collect();
        for origin in extra {
            let origin = normalize(origin.as_ref());
            if !origin.is_empty() && !allowed.contains(&origin) {
                allowed.push(origin);
            }
        }
        Self { allowed }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = normalize(origin);
        self.allowed.contains(&origin) || local_origin_re().is_match(&origin)
    }

    pub fn check(&self, origin: Option<&str>) -> OriginCheck {
        match origin {
            None => OriginCheck::Absent,
            Some(origin) if self.is_allowed(origin) => OriginCheck::Allowed,
            Some(_) => OriginCheck::Denied,
        }
    }

    /// `Access-Control-Allow-Origin` value: the origin itself when allowed,
    /// otherwise the first allow-listed origin
    pub fn allow_origin(&self, origin: Option<&str>) -> String {
        match origin {
            Some(origin) if self.is_allowed(origin) => origin.trim().to_string(),
            _ => self.allowed.first().cloned().unwrap_or_default(),
        }
    }
}

/// `Origin` header value, if present and readable
pub fn request_origin(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn apply_cors_headers(policy: &OriginPolicy, origin: Option<&str>, headers: &mut HeaderMap) {
    if let Ok(v) = HeaderValue::from_str(&policy.allow_origin(origin)) {
        headers.insert("access-control-allow-origin", v);
    }
    headers.insert("vary", HeaderValue::from_static("Origin"));
    headers.insert(
        "access-control-expose-headers",
        HeaderValue::from_static(EXPOSE_HEADERS),
    );
}

/// Answers preflight requests and decorates every response with CORS
/// headers
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = request_origin(req.headers()).map(str::to_string);

    if *req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        let headers = resp.headers_mut();
        apply_cors_headers(&state.origins, origin.as_deref(), headers);
        headers.insert(
            "access-control-allow-methods",
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            "access-control-allow-headers",
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert("access-control-max-age", HeaderValue::from_static("86400"));
        return resp;
    }

    let mut resp = next.run(req).await;
    apply_cors_headers(&state.origins, origin.as_deref(), resp.headers_mut());
    resp
}
