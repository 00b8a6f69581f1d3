use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

use kagami::config::{AppConfig, EmbedderConfig, EmbedderKind};
use kagami::web::{create_app_state, create_router, AppState};

const BOUNDARY: &str = "kagami-test-boundary";

fn write_solid_image(path: &Path, color: [u8; 3]) {
    let img = RgbImage::from_pixel(16, 16, Rgb(color));
    img.save(path).unwrap();
}

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, Rgb(color));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn multipart_body(file_name: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn search_request(file_name: &str, contents: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/search")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(file_name, contents)))
        .unwrap()
}

/// Build a router over a temp directory tree with a two-image dataset.
fn test_app(root: &Path) -> (Arc<AppState>, Router) {
    let dataset_dir = root.join("dataset");
    std::fs::create_dir_all(&dataset_dir).unwrap();
    write_solid_image(&dataset_dir.join("red.png"), [250, 10, 10]);
    write_solid_image(&dataset_dir.join("blue.png"), [10, 10, 250]);

    let config = AppConfig {
        dataset_dir,
        index_dir: root.join("index"),
        upload_dir: root.join("uploads"),
        embedder: EmbedderConfig {
            kind: EmbedderKind::Histogram,
            histogram_bins: 4,
            ..EmbedderConfig::default()
        },
        ..AppConfig::default()
    };

    let state = create_app_state(config).unwrap();
    let router = create_router(Arc::clone(&state));
    (state, router)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

#[tokio::test]
async fn index_page_shows_upload_form() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("<form"));
    assert!(body.contains("multipart/form-data"));
}

#[tokio::test]
async fn about_page_describes_the_pipeline() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/about")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("How a search works"));
}

#[tokio::test]
async fn oversized_upload_is_rejected_with_flash() {
    let root = tempfile::tempdir().unwrap();
    let dataset_dir = root.path().join("dataset");
    std::fs::create_dir_all(&dataset_dir).unwrap();
    write_solid_image(&dataset_dir.join("red.png"), [250, 10, 10]);

    let config = AppConfig {
        dataset_dir,
        index_dir: root.path().join("index"),
        upload_dir: root.path().join("uploads"),
        max_upload_bytes: 1024 * 1024,
        ..AppConfig::default()
    };
    let state = create_app_state(config).unwrap();
    let router = create_router(state);

    let response = router
        .oneshot(search_request("query.png", &vec![0u8; 2 * 1024 * 1024]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("File too large"));
    assert!(!root.path().join("uploads").exists());
}

#[tokio::test]
async fn health_reports_zero_before_first_search() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["indexed_images"], 0);
}

#[tokio::test]
async fn upload_with_invalid_extension_is_rejected_with_flash() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router
        .oneshot(search_request("malware.exe", b"whatever"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Invalid file type"));
    // Rejected uploads never reach the upload directory
    assert!(!root.path().join("uploads").exists());
}

#[tokio::test]
async fn upload_without_file_name_is_rejected_with_flash() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router.oneshot(search_request("", b"bytes")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("No selected file"));
}

#[tokio::test]
async fn search_builds_index_lazily_and_renders_results() {
    let root = tempfile::tempdir().unwrap();
    let (state, router) = test_app(root.path());

    let response = router
        .clone()
        .oneshot(search_request("query.png", &png_bytes([245, 15, 15])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Search results"));
    assert!(body.contains("red.png"));
    assert!(body.contains("/static/dataset/"));
    assert!(body.contains("/static/uploads/"));

    // The first search built and persisted the index
    assert!(root.path().join("index").join("vectors.bin").exists());
    assert!(root.path().join("index").join("paths.json").exists());

    // And health now reflects the loaded index
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["indexed_images"], 2);

    // The uploaded query image was stored with a sanitized unique name
    let uploads: Vec<_> = std::fs::read_dir(state.config.upload_dir.clone())
        .unwrap()
        .collect();
    assert_eq!(uploads.len(), 1);
}

#[tokio::test]
async fn dataset_images_are_served_statically() {
    let root = tempfile::tempdir().unwrap();
    let (_state, router) = test_app(root.path());

    let response = router
        .oneshot(
            Request::builder()
                .uri("/static/dataset/red.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
