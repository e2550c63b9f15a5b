//! In-process router tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use m4bforge::config::Config;
use m4bforge::server::{create_router, prepare_work_dir, AppContext};
use m4bforge_av::{FfmpegEncoder, MediaEncoder};
use tower::ServiceExt;

const BOUNDARY: &str = "m4bforge-test-boundary";

fn router(config: Config) -> axum::Router {
    let encoder: Arc<dyn MediaEncoder> = Arc::new(FfmpegEncoder::new(None));
    create_router(AppContext::new(config, encoder))
}

fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: audio/mpeg\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let mut config = Config::default();
    config.server.max_upload_mb = 1;
    let work_dir = tempfile::tempdir().unwrap();
    config.server.work_dir = Some(work_dir.path().to_path_buf());

    let data = vec![0u8; 2 * 1024 * 1024];
    let req = Request::builder()
        .method("POST")
        .uri("/api/mp3-to-m4b")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("mp3_file", "big.mp3", &data)))
        .unwrap();

    let resp = router(config).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = json_body(resp).await;
    assert_eq!(json["error"], "File too large. Maximum size is 1MB.");
    assert_eq!(json["code"], "payload_too_large");
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let work_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.server.work_dir = Some(work_dir.path().to_path_buf());

    let req = Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("source_file", "empty.mp3", b"")))
        .unwrap();

    let resp = router(config).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = json_body(resp).await;
    assert_eq!(json["error"], "Invalid input: Uploaded file is empty");
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/convert")
        .header(header::ORIGIN, "http://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let resp = router(Config::default()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn static_dir_is_served_as_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>m4bforge</h1>").unwrap();

    let mut config = Config::default();
    config.server.static_dir = Some(dir.path().to_path_buf());

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let resp = router(config).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>m4bforge</h1>");
}

#[tokio::test]
async fn api_routes_take_precedence_over_static_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.server.static_dir = Some(dir.path().to_path_buf());

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = router(config).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn work_dir_is_created_before_serving() {
    let base = tempfile::tempdir().unwrap();
    let work_dir = base.path().join("nested").join("work");

    let mut config = Config::default();
    config.server.work_dir = Some(work_dir.clone());
    prepare_work_dir(&config).await.unwrap();
    assert!(work_dir.is_dir());

    let req = Request::builder()
        .method("POST")
        .uri("/api/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body("source_file", "empty.mp3", b"")))
        .unwrap();

    // The request gets as far as validating the upload, so a workspace was
    // created inside the prepared directory.
    let resp = router(config).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(&work_dir).unwrap().count(), 0);
}
