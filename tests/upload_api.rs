//! End-to-end tests for the `/upload` routes against the local backend.

use asset_store::{
    StorageConfig, StorageService,
    routes::routes::app,
    services::{backend::Backends, local_backend::LocalBackend},
};
use axum::http::{Method, StatusCode};
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

fn server_with(config: StorageConfig) -> TestServer {
    let service = StorageService::new(config).expect("storage service");
    TestServer::new(app(service)).expect("test server")
}

fn local_server() -> (TempDir, TestServer) {
    let dir = TempDir::new().unwrap();
    let server = server_with(StorageConfig::local(dir.path()));
    (dir, server)
}

fn jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len, 0x42);
    data
}

fn file_form(data: Vec<u8>, name: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(data).file_name(name).mime_type(mime))
}

#[tokio::test]
async fn upload_head_delete_scenario() {
    let (dir, server) = local_server();

    let form = file_form(jpeg(2048), "team.jpg", "image/jpeg").add_text("folder", "services");
    let response = server.post("/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["storageType"], "local");
    assert_eq!(body["originalName"], "team.jpg");
    assert_eq!(body["size"], 2048);
    assert_eq!(body["type"], "image/jpeg");
    let url = body["url"].as_str().unwrap().to_string();
    let filename = body["filename"].as_str().unwrap();
    assert_eq!(url, format!("/uploads/services/{}", filename));
    assert!(dir.path().join("services").join(filename).is_file());

    let head = server
        .method(Method::HEAD, "/upload")
        .add_query_param("url", &url)
        .await;
    assert_eq!(head.status_code(), StatusCode::OK);
    assert_eq!(head.header("x-asset-exists"), "true");
    assert_eq!(head.header("x-asset-size"), "2048");

    let deleted = server.delete("/upload").add_query_param("url", &url).await;
    assert_eq!(deleted.status_code(), StatusCode::OK);
    let body: Value = deleted.json();
    assert_eq!(body["success"], true);

    let head = server
        .method(Method::HEAD, "/upload")
        .add_query_param("url", &url)
        .await;
    assert_eq!(head.status_code(), StatusCode::OK);
    assert_eq!(head.header("x-asset-exists"), "false");
}

#[tokio::test]
async fn status_report_as_json() {
    let (_dir, server) = local_server();
    let form = file_form(jpeg(100), "photo.png", "image/png").add_text("folder", "testimonials");
    let body: Value = server.post("/upload").multipart(form).await.json();
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.contains("/testimonials/"));
    assert!(url.ends_with(".png"));

    let report: Value = server
        .get("/upload")
        .add_query_param("url", &url)
        .await
        .json();
    assert_eq!(report["exists"], true);
    assert_eq!(report["size"], 100);
    assert!(report["uploadedAt"].is_string());
}

#[tokio::test]
async fn uploaded_files_are_served() {
    let (_dir, server) = local_server();
    let data = jpeg(512);
    let body: Value = server
        .post("/upload")
        .multipart(file_form(data.clone(), "a.jpg", "image/jpeg"))
        .await
        .json();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/uploads/"), "default folder: {url}");

    let served = server.get(url).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.as_bytes().as_ref(), data.as_slice());
}

#[tokio::test]
async fn rejects_unsupported_type() {
    let (dir, server) = local_server();
    let response = server
        .post("/upload")
        .multipart(file_form(b"%PDF-1.7".to_vec(), "doc.pdf", "application/pdf"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("application/pdf"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn size_limit_is_inclusive() {
    let dir = TempDir::new().unwrap();
    let mut config = StorageConfig::local(dir.path());
    config.max_bytes = 4096;
    let server = server_with(config);

    let ok = server
        .post("/upload")
        .multipart(file_form(jpeg(4096), "a.jpg", "image/jpeg"))
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);

    let too_big = server
        .post("/upload")
        .multipart(file_form(jpeg(4097), "a.jpg", "image/jpeg"))
        .await;
    assert_eq!(too_big.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = too_big.json();
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn body_far_over_the_limit_is_a_bad_request() {
    let dir = TempDir::new().unwrap();
    let mut config = StorageConfig::local(dir.path());
    config.max_bytes = 1024;
    let server = server_with(config);

    let response = server
        .post("/upload")
        .multipart(file_form(jpeg(200 * 1024), "big.jpg", "image/jpeg"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("File too large"), "{error}");
    assert!(error.contains("1024"));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn second_file_part_is_rejected() {
    let (dir, server) = local_server();
    let form = file_form(jpeg(32), "a.jpg", "image/jpeg").add_part(
        "file",
        Part::bytes(jpeg(32)).file_name("b.jpg").mime_type("image/jpeg"),
    );

    let response = server.post("/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn missing_file_is_a_bad_request() {
    let (_dir, server) = local_server();
    let response = server
        .post("/upload")
        .multipart(MultipartForm::new().add_text("folder", "services"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn traversal_folder_is_a_bad_request() {
    let (_dir, server) = local_server();
    let form = file_form(jpeg(10), "a.jpg", "image/jpeg").add_text("folder", "../../etc");
    let response = server.post("/upload").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_and_status_require_url() {
    let (_dir, server) = local_server();
    assert_eq!(
        server.delete("/upload").await.status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        server.get("/upload").await.status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        server
            .delete("/upload")
            .add_query_param("url", "")
            .await
            .status_code(),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn foreign_urls_are_harmless() {
    let (_dir, server) = local_server();
    let url = "https://unrelated.example/x.png";

    let report: Value = server
        .get("/upload")
        .add_query_param("url", url)
        .await
        .json();
    assert_eq!(report["exists"], false);

    let deleted = server.delete("/upload").add_query_param("url", url).await;
    assert_eq!(deleted.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_twice_succeeds() {
    let (_dir, server) = local_server();
    let body: Value = server
        .post("/upload")
        .multipart(file_form(jpeg(64), "a.webp", "image/webp"))
        .await
        .json();
    let url = body["url"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = server.delete("/upload").add_query_param("url", &url).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }
}

#[tokio::test]
async fn probes_report_ok() {
    let (_dir, server) = local_server();
    assert_eq!(server.get("/healthz").await.status_code(), StatusCode::OK);

    let ready = server.get("/readyz").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    let body: Value = ready.json();
    assert_eq!(body["storageType"], "local");
    assert_eq!(body["checks"]["disk"]["ok"], true);
}

#[tokio::test]
async fn readiness_fails_without_cloud_backend() {
    let dir = TempDir::new().unwrap();
    let mut config = StorageConfig::local(dir.path());
    config.production = true;
    config.blob_token = Some("vercel_blob_rw_unwired".into());
    let service = StorageService::with_backends(
        config,
        Backends {
            local: Arc::new(LocalBackend::new(dir.path())),
            cloud: None,
        },
    );
    let server = TestServer::new(app(service)).unwrap();

    let ready = server.get("/readyz").await;
    assert_eq!(ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = ready.json();
    assert_eq!(body["storageType"], "cloud");
    assert_eq!(body["checks"]["backend"]["ok"], false);
    assert_eq!(body["checks"]["disk"]["ok"], true);
}
