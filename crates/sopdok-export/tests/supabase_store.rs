//! Supabase storage client against a stand-in storage API

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use sopdok_export::{CacheError, CacheStore, SupabaseStorage, UploadOptions};

const SERVICE_KEY: &str = "service-role-key";

#[derive(Clone, Default)]
struct Storage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    upserts: Arc<Mutex<Vec<String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {SERVICE_KEY}"));
    let apikey = headers
        .get("apikey")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == SERVICE_KEY);
    bearer && apikey
}

async fn download(
    State(storage): State<Storage>,
    Path((bucket, object)): Path<(String, String)>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Vec::new());
    }
    match storage.objects.lock().unwrap().get(&format!("{bucket}/{object}")) {
        Some(bytes) => (StatusCode::OK, bytes.clone()),
        // Storage reports missing objects as 400 with a not_found body
        None => (
            StatusCode::BAD_REQUEST,
            br#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#.to_vec(),
        ),
    }
}

async fn upload(
    State(storage): State<Storage>,
    Path((bucket, object)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    if let Some(upsert) = headers.get("x-upsert").and_then(|v| v.to_str().ok()) {
        storage.upserts.lock().unwrap().push(upsert.to_string());
    }
    storage
        .objects
        .lock()
        .unwrap()
        .insert(format!("{bucket}/{object}"), body.to_vec());
    StatusCode::OK
}

async fn spawn_service(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn storage_service() -> (SocketAddr, Storage) {
    let storage = Storage::default();
    let app = Router::new()
        .route(
            "/storage/v1/object/:bucket/:object",
            get(download).post(upload),
        )
        .with_state(storage.clone());
    (spawn_service(app).await, storage)
}

#[tokio::test]
async fn test_missing_object_is_a_miss() {
    let (addr, _) = storage_service().await;
    let store = SupabaseStorage::new(format!("http://{addr}"), SERVICE_KEY, "exports").unwrap();
    assert_eq!(store.download("absent.pdf").await.unwrap(), None);
}

#[tokio::test]
async fn test_upload_then_download() {
    let (addr, storage) = storage_service().await;
    let store = SupabaseStorage::new(format!("http://{addr}"), SERVICE_KEY, "exports").unwrap();

    store
        .upload(
            "sop-12.pdf",
            b"%PDF-1.7",
            &UploadOptions::overwrite("application/pdf"),
        )
        .await
        .unwrap();

    assert_eq!(
        store.download("sop-12.pdf").await.unwrap(),
        Some(b"%PDF-1.7".to_vec())
    );
    assert!(storage.objects.lock().unwrap().contains_key("exports/sop-12.pdf"));
    assert_eq!(storage.upserts.lock().unwrap().as_slice(), ["true"]);
}

#[tokio::test]
async fn test_wrong_key_is_an_error_not_a_miss() {
    let (addr, _) = storage_service().await;
    let store = SupabaseStorage::new(format!("http://{addr}"), "anon-key", "exports").unwrap();

    let err = store.download("sop-12.pdf").await.unwrap_err();
    assert!(matches!(err, CacheError::Status { status: 401, .. }));
}
