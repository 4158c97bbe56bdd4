//! Export endpoint over real HTTP

use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sopdok_export::{ExportPipeline, MemoryCache};
use sopdok_render::{HtmlRenderer, PdfOptions, RenderError, ScreenshotOptions};
use sopdok_server::{app_state, build_router, AppState, OriginPolicy, ServiceConfig};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Default)]
struct FakeRenderer {
    calls: AtomicUsize,
}

#[async_trait]
impl HtmlRenderer for FakeRenderer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn render_pdf(&self, _: &str, _: &PdfOptions) -> sopdok_render::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(b"%PDF-1.7 rendered".to_vec())
    }

    async fn screenshot(&self, _: &str, options: &ScreenshotOptions) -> sopdok_render::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&13u32.to_be_bytes());
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&options.width.to_be_bytes());
        png.extend_from_slice(&options.height.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0]);
        Ok(png)
    }
}

struct FailingRenderer;

#[async_trait]
impl HtmlRenderer for FailingRenderer {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn render_pdf(&self, _: &str, _: &PdfOptions) -> sopdok_render::Result<Vec<u8>> {
        Err(RenderError::ServerError {
            status: 502,
            message: "chromium crashed".to_string(),
        })
    }

    async fn screenshot(&self, _: &str, _: &ScreenshotOptions) -> sopdok_render::Result<Vec<u8>> {
        Err(RenderError::EmptyResponse)
    }
}

async fn spawn(state: AppState, max_body_bytes: usize) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state, max_body_bytes);
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn spawn_with(pipeline: ExportPipeline) -> SocketAddr {
    let state = AppState::new(pipeline, OriginPolicy::new(["https://sop.example.org"]));
    spawn(state, 1024 * 1024).await
}

async fn spawn_rendering() -> (SocketAddr, Arc<FakeRenderer>) {
    let renderer = Arc::new(FakeRenderer::default());
    let pipeline = ExportPipeline::new()
        .with_renderer(renderer.clone())
        .with_cache(Arc::new(MemoryCache::new()));
    (spawn_with(pipeline).await, renderer)
}

fn export_body(format: &str) -> Value {
    json!({
        "html": "<html><body><div class=\"sop-page\">A</div><div class=\"sop-page\">B</div></body></html>",
        "format": format,
        "metadata": {"title": "Hand Hygiene", "stand": "2024-03", "documentId": "SOP-12"},
    })
}

async fn post(addr: SocketAddr, path: &str, origin: Option<&str>, body: &Value) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(format!("http://{addr}{path}"))
        .json(body);
    if let Some(origin) = origin {
        request = request.header("origin", origin);
    }
    request.send().await.expect("send request")
}

fn header<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn missing_html_is_400() {
        let (addr, renderer) = spawn_rendering().await;
        let resp = post(addr, "/", None, &json!({"format": "pdf"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "invalid_request");
        assert!(body["message"].as_str().unwrap().contains("html"));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_format_is_400() {
        let (addr, _) = spawn_rendering().await;
        let resp = post(addr, "/export", None, &json!({"html": "<p/>", "format": "odt"})).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (addr, _) = spawn_rendering().await;
        let resp = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let state = AppState::new(
            ExportPipeline::new().with_renderer(Arc::new(FakeRenderer::default())),
            OriginPolicy::default(),
        );
        let addr = spawn(state, 64).await;
        let big = json!({"html": "x".repeat(1024), "format": "pdf"});
        let resp = post(addr, "/", None, &big).await;
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}

mod origins {
    use super::*;

    #[tokio::test]
    async fn foreign_origin_is_403_with_first_allowed_origin() {
        let (addr, renderer) = spawn_rendering().await;
        let resp = post(addr, "/", Some("https://evil.example.com"), &export_body("pdf")).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            header(&resp, "access-control-allow-origin"),
            Some("https://sopdok.app")
        );
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "origin_not_allowed");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn configured_and_local_origins_are_echoed() {
        let (addr, _) = spawn_rendering().await;
        for origin in ["https://sop.example.org", "http://localhost:5173", "http://127.0.0.1:4000"] {
            let resp = post(addr, "/", Some(origin), &export_body("pdf")).await;
            assert_eq!(resp.status(), StatusCode::OK, "origin {origin}");
            assert_eq!(header(&resp, "access-control-allow-origin"), Some(origin));
            assert_eq!(header(&resp, "vary"), Some("Origin"));
        }
    }

    #[tokio::test]
    async fn missing_origin_is_accepted() {
        let (addr, _) = spawn_rendering().await;
        let resp = post(addr, "/", None, &export_body("pdf")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn preflight_is_answered() {
        let (addr, _) = spawn_rendering().await;
        let resp = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{addr}/export"))
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            header(&resp, "access-control-allow-origin"),
            Some("http://localhost:5173")
        );
        assert!(header(&resp, "access-control-allow-methods")
            .unwrap()
            .contains("POST"));
        assert!(header(&resp, "access-control-allow-headers")
            .unwrap()
            .contains("content-type"));
    }
}

mod exports {
    use super::*;

    #[tokio::test]
    async fn pdf_download_headers() {
        let (addr, _) = spawn_rendering().await;
        let resp = post(addr, "/", None, &export_body("pdf")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some("application/pdf"));
        assert_eq!(
            header(&resp, "content-disposition"),
            Some("attachment; filename=\"Hand Hygiene.pdf\"")
        );
        assert_eq!(header(&resp, "x-cache"), Some("MISS"));
        assert!(resp.bytes().await.unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn docx_download() {
        let (addr, renderer) = spawn_rendering().await;
        let resp = post(addr, "/export", None, &export_body("docx")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "content-type"), Some(DOCX_MIME));
        assert_eq!(
            header(&resp, "content-disposition"),
            Some("attachment; filename=\"Hand Hygiene.docx\"")
        );
        // Two page containers, two captures
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert!(resp.bytes().await.unwrap().starts_with(b"PK"));
    }

    #[tokio::test]
    async fn cached_export_is_a_hit() {
        let (addr, renderer) = spawn_rendering().await;
        let mut body = export_body("pdf");
        body["cacheKey"] = json!("sop-12-rev-3");

        let first = post(addr, "/", None, &body).await;
        assert_eq!(header(&first, "x-cache"), Some("MISS"));
        let first = first.bytes().await.unwrap();

        let second = post(addr, "/", None, &body).await;
        assert_eq!(header(&second, "x-cache"), Some("HIT"));
        assert_eq!(second.bytes().await.unwrap(), first);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }
}

mod fallback {
    use super::*;

    #[tokio::test]
    async fn unconfigured_renderer_is_503() {
        let addr = spawn_with(ExportPipeline::new()).await;
        let resp = post(addr, "/", None, &export_body("pdf")).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["fallback"], true);
        assert_eq!(body["error"], "renderer_unavailable");
    }

    #[tokio::test]
    async fn renderer_failure_is_503() {
        let addr = spawn_with(ExportPipeline::new().with_renderer(Arc::new(FailingRenderer))).await;
        let resp = post(addr, "/", None, &export_body("docx")).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["fallback"], true);
    }
}

#[tokio::test]
async fn healthz_reports_collaborators() {
    let (addr, _) = spawn_rendering().await;
    let body: Value = reqwest::get(format!("http://{addr}/healthz"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["renderer"], true);
    assert_eq!(body["cache"], true);
}

#[tokio::test]
async fn state_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\nallowed_origins = [\"https://sop.example.org\"]\nmax_body_bytes = 4096"
    )
    .unwrap();

    let config = ServiceConfig::from_file(file.path()).unwrap();
    assert_eq!(config.server.max_body_bytes, 4096);

    let state = app_state(&config).unwrap();
    assert!(state.origins.is_allowed("https://sop.example.org"));
    assert!(!state.pipeline.has_renderer());

    let addr = spawn(state, config.server.max_body_bytes).await;
    let resp = post(addr, "/", Some("https://sop.example.org"), &export_body("pdf")).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
